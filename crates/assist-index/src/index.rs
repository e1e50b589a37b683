//! Similarity index over question/answer entries.
//!
//! Each entry contributes one vector for its primary question and one per
//! variation. A query is scored against every vector by cosine similarity;
//! results are deduplicated by entry so one entry appears at most once.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use assist_types::{QaEntry, QaId};

use crate::text::{normalize, tokenize};
use crate::tfidf::{SparseVector, TfIdfModel};

/// Which phrasing of an entry produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Main,
    Variation,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Main => "main",
            MatchType::Variation => "variation",
        }
    }
}

/// One ranked match returned by [`KnowledgeIndex::search`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: Arc<QaEntry>,
    /// Cosine similarity in [0, 1]
    pub score: f32,
    pub match_type: MatchType,
}

/// Read-only search over a built knowledge corpus.
///
/// The orchestrator depends on this trait rather than on
/// [`KnowledgeIndex`] directly.
pub trait KnowledgeSearch: Send + Sync {
    /// Ranked, deduplicated matches with `score >= min_score`.
    fn search(&self, query: &str, top_k: usize, min_score: f32) -> Vec<SearchResult>;

    /// Look up an entry by id.
    fn get(&self, id: &QaId) -> Option<Arc<QaEntry>>;

    /// Number of indexed entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct IndexedVector {
    /// Position of the owning entry in `entries`
    entry: usize,
    match_type: MatchType,
    vector: SparseVector,
}

/// Why an entry was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyQuestion,
    DuplicateId,
}

/// Summary of an index build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub indexed: usize,
    pub vectors: usize,
    pub vocabulary: usize,
    pub skipped: Vec<(QaId, SkipReason)>,
}

/// TF-IDF index built once over a fixed corpus.
#[derive(Debug, Default)]
pub struct KnowledgeIndex {
    entries: Vec<Arc<QaEntry>>,
    by_id: HashMap<QaId, usize>,
    vectors: Vec<IndexedVector>,
    model: TfIdfModel,
    report: BuildReport,
}

impl KnowledgeIndex {
    /// Build the index. Never fails; unusable entries are logged and skipped.
    pub fn build(entries: impl IntoIterator<Item = QaEntry>) -> Self {
        let mut kept: Vec<Arc<QaEntry>> = Vec::new();
        let mut by_id: HashMap<QaId, usize> = HashMap::new();
        let mut skipped: Vec<(QaId, SkipReason)> = Vec::new();
        // (entry position, match type, tokens)
        let mut documents: Vec<(usize, MatchType, Vec<String>)> = Vec::new();

        for entry in entries {
            let question = normalize(&entry.question);
            if question.is_empty() {
                warn!(id = %entry.id, "Skipping entry with empty question");
                skipped.push((entry.id.clone(), SkipReason::EmptyQuestion));
                continue;
            }
            if by_id.contains_key(&entry.id) {
                warn!(id = %entry.id, "Skipping entry with duplicate id");
                skipped.push((entry.id.clone(), SkipReason::DuplicateId));
                continue;
            }

            let position = kept.len();
            documents.push((position, MatchType::Main, tokenize(&question)));
            for variation in &entry.variations {
                let normalized = normalize(variation);
                if normalized.is_empty() {
                    debug!(id = %entry.id, "Ignoring empty variation");
                    continue;
                }
                documents.push((position, MatchType::Variation, tokenize(&normalized)));
            }

            by_id.insert(entry.id.clone(), position);
            kept.push(Arc::new(entry));
        }

        let token_lists: Vec<Vec<String>> =
            documents.iter().map(|(_, _, tokens)| tokens.clone()).collect();
        let model = TfIdfModel::fit(&token_lists);

        let vectors: Vec<IndexedVector> = documents
            .into_iter()
            .map(|(entry, match_type, tokens)| IndexedVector {
                entry,
                match_type,
                vector: model.transform(&tokens),
            })
            .collect();

        let report = BuildReport {
            indexed: kept.len(),
            vectors: vectors.len(),
            vocabulary: model.vocabulary_size(),
            skipped,
        };

        info!(
            entries = report.indexed,
            vectors = report.vectors,
            vocabulary = report.vocabulary,
            skipped = report.skipped.len(),
            "Built knowledge index"
        );

        Self {
            entries: kept,
            by_id,
            vectors,
            model,
            report,
        }
    }

    /// Ranked matches for `query`.
    ///
    /// Scores every indexed vector, stable-sorts descending (ties keep
    /// insertion order), takes `top_k`, drops scores below `min_score`,
    /// then keeps the first occurrence of each entry.
    pub fn search(&self, query: &str, top_k: usize, min_score: f32) -> Vec<SearchResult> {
        if top_k == 0 || self.vectors.is_empty() {
            return Vec::new();
        }

        let query_vector = self.model.transform(&tokenize(&normalize(query)));
        if query_vector.is_zero() {
            debug!("Query has no indexed terms");
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.vector.dot(&query_vector).clamp(0.0, 1.0)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut seen: HashSet<usize> = HashSet::new();
        let results: Vec<SearchResult> = scored
            .into_iter()
            .take(top_k)
            .filter(|(_, score)| *score >= min_score)
            .filter_map(|(i, score)| {
                let indexed = &self.vectors[i];
                seen.insert(indexed.entry).then(|| SearchResult {
                    entry: Arc::clone(&self.entries[indexed.entry]),
                    score,
                    match_type: indexed.match_type,
                })
            })
            .collect();

        debug!(
            results = results.len(),
            best = results.first().map(|r| r.score).unwrap_or(0.0),
            "Knowledge index search"
        );

        results
    }

    pub fn get(&self, id: &QaId) -> Option<Arc<QaEntry>> {
        self.by_id.get(id).map(|&i| Arc::clone(&self.entries[i]))
    }

    /// Indexed entries in load order.
    pub fn entries(&self) -> &[Arc<QaEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn vector_count(&self) -> usize {
        self.vectors.len()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Most characteristic corpus terms, for diagnostics.
    pub fn top_terms(&self, n: usize) -> Vec<(String, f32)> {
        self.model.top_terms(n)
    }
}

impl KnowledgeSearch for KnowledgeIndex {
    fn search(&self, query: &str, top_k: usize, min_score: f32) -> Vec<SearchResult> {
        KnowledgeIndex::search(self, query, top_k, min_score)
    }

    fn get(&self, id: &QaId) -> Option<Arc<QaEntry>> {
        KnowledgeIndex::get(self, id)
    }

    fn len(&self) -> usize {
        KnowledgeIndex::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::{Rng, SeedableRng};

    fn sample_entries() -> Vec<QaEntry> {
        vec![
            QaEntry::new("1", "frais de transaction", "1% avec un minimum de 500 F CFA")
                .with_variations(["combien coute un transfert", "tarifs des envois"])
                .with_category("frais")
                .with_related(["2"]),
            QaEntry::new("2", "Quel est le délai de transfert ?", "Moins de 2 heures")
                .with_variations(["temps de reception de l'argent"])
                .with_category("delais"),
            QaEntry::new("3", "Comment sécuriser mon compte ?", "Activez la double authentification")
                .with_variations(["protection du compte contre la fraude"])
                .with_category("securite"),
            QaEntry::new("4", "Comment créer un compte ?", "Téléchargez l'application")
                .with_variations(["inscription nouveau compte"])
                .with_category("compte"),
        ]
    }

    #[test]
    fn test_frais_scenario() {
        let index = KnowledgeIndex::build(sample_entries());
        let results = index.search("Quels sont vos frais ?", 3, 0.3);

        assert!(!results.is_empty());
        assert_eq!(results[0].entry.id.as_str(), "1");
        assert_eq!(results[0].match_type, MatchType::Main);
        assert!(results[0].score >= 0.6);
    }

    #[test]
    fn test_variation_match() {
        let index = KnowledgeIndex::build(sample_entries());
        let results = index.search("inscription nouveau compte", 3, 0.3);

        assert_eq!(results[0].entry.id.as_str(), "4");
        assert_eq!(results[0].match_type, MatchType::Variation);
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_results_deduplicated_by_entry() {
        // Both the question and the variation of entry 3 mention "compte"
        let index = KnowledgeIndex::build(sample_entries());
        let results = index.search("compte", 10, 0.0);

        let mut ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_top_k_zero_and_zero_vector() {
        let index = KnowledgeIndex::build(sample_entries());
        assert!(index.search("frais", 0, 0.0).is_empty());
        assert!(index.search("what is the", 3, 0.0).is_empty());
        assert!(index.search("", 3, 0.0).is_empty());
        assert!(index.search("bitcoin ethereum", 3, 0.0).is_empty());
    }

    #[test]
    fn test_empty_corpus() {
        let index = KnowledgeIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.vector_count(), 0);
        assert!(index.search("frais", 3, 0.0).is_empty());
    }

    #[test]
    fn test_skips_empty_questions_and_duplicate_ids() {
        let mut entries = sample_entries();
        entries.push(QaEntry::new("5", "   ?! ", "nothing"));
        entries.push(QaEntry::new("1", "duplicate", "ignored"));

        let index = KnowledgeIndex::build(entries);

        assert_eq!(index.len(), 4);
        assert_eq!(index.report().skipped.len(), 2);
        assert_eq!(index.report().skipped[0].1, SkipReason::EmptyQuestion);
        assert_eq!(index.report().skipped[1].1, SkipReason::DuplicateId);
        assert_eq!(index.get(&QaId::new("1")).unwrap().question, "frais de transaction");
        assert!(index.get(&QaId::new("5")).is_none());
    }

    #[test]
    fn test_vectors_per_entry() {
        let index = KnowledgeIndex::build(sample_entries());
        // 4 questions + 5 variations
        assert_eq!(index.vector_count(), 9);
        assert_eq!(index.entries()[2].id.as_str(), "3");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = KnowledgeIndex::build(vec![
            QaEntry::new("a", "virement bancaire", "A"),
            QaEntry::new("b", "virement bancaire", "B"),
        ]);
        let results = index.search("virement", 2, 0.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.id.as_str(), "a");
        assert_eq!(results[1].entry.id.as_str(), "b");
    }

    #[test]
    fn test_randomized_queries_sorted_unique_above_threshold() {
        let index = KnowledgeIndex::build(sample_entries());
        let vocabulary = [
            "frais", "transfert", "compte", "securiser", "delai", "argent", "fraude", "tarifs",
            "inscription", "quel", "est", "le", "bonjour", "bitcoin", "?", "combien",
        ];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let len = rng.random_range(0..6);
            let query: Vec<&str> = (0..len)
                .filter_map(|_| vocabulary.choose(&mut rng).copied())
                .collect();
            let query = query.join(" ");
            let top_k = rng.random_range(0..5);
            let min_score: f32 = rng.random_range(0.0..0.8);

            let results = index.search(&query, top_k, min_score);

            assert!(results.len() <= top_k);
            let mut seen = HashSet::new();
            for r in &results {
                assert!(r.score >= min_score, "score below threshold for {query:?}");
                assert!(r.score <= 1.0);
                assert!(seen.insert(r.entry.id.clone()), "duplicate id for {query:?}");
            }
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn test_trait_object() {
        let index: Arc<dyn KnowledgeSearch> = Arc::new(KnowledgeIndex::build(sample_entries()));
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
        assert!(index.get(&QaId::new("2")).is_some());
        assert!(!index.search("délai", 3, 0.1).is_empty());
    }
}
