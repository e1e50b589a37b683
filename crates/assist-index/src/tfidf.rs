//! TF-IDF vectorizer with sparse, L2-normalized vectors.
//!
//! Term weights are raw counts scaled by a smoothed IDF:
//! `ln((N + 1) / (df + 1)) + 1`. Vectors are stored as `(term, weight)`
//! pairs sorted by term id, so cosine similarity of two normalized vectors
//! is a merge-join dot product.

use std::collections::{HashMap, HashSet};

/// Sparse vector over the vocabulary, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    terms: Vec<(u32, f32)>,
}

impl SparseVector {
    /// True when no term carries weight. A zero vector matches nothing.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Dot product. For two normalized vectors this is cosine similarity.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.terms.len() && j < other.terms.len() {
            let (a_id, a_w) = self.terms[i];
            let (b_id, b_w) = other.terms[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn from_weights(mut terms: Vec<(u32, f32)>) -> Self {
        terms.retain(|(_, w)| *w > 0.0);
        let norm = terms.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Self::default();
        }
        for (_, w) in terms.iter_mut() {
            *w /= norm;
        }
        terms.sort_by_key(|(id, _)| *id);
        Self { terms }
    }
}

/// Vocabulary and IDF weights fitted over a corpus of tokenized documents.
#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    /// Term -> term id (assigned in order of first appearance)
    vocabulary: HashMap<String, u32>,
    /// Term id -> smoothed IDF
    idf: Vec<f32>,
    /// Term id -> total count across the corpus
    corpus_counts: Vec<usize>,
}

impl TfIdfModel {
    /// Fit the vocabulary and IDF weights on tokenized documents.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, u32> = HashMap::new();
        let mut doc_frequencies: Vec<usize> = Vec::new();
        let mut corpus_counts: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen: HashSet<u32> = HashSet::new();
            for term in doc {
                let next_id = vocabulary.len() as u32;
                let id = *vocabulary.entry(term.clone()).or_insert(next_id);
                if id == next_id {
                    doc_frequencies.push(0);
                    corpus_counts.push(0);
                }
                corpus_counts[id as usize] += 1;
                // Each term counted once per document
                if seen.insert(id) {
                    doc_frequencies[id as usize] += 1;
                }
            }
        }

        let n = documents.len() as f32;
        let idf = doc_frequencies
            .iter()
            .map(|&df| ((n + 1.0) / (df as f32 + 1.0)).ln() + 1.0)
            .collect();

        Self {
            vocabulary,
            idf,
            corpus_counts,
        }
    }

    /// Vectorize a tokenized text. Out-of-vocabulary terms are ignored.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let weights = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();

        SparseVector::from_weights(weights)
    }

    /// IDF weight of a term, or `None` when it is out of vocabulary.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary
            .get(term)
            .map(|&id| self.idf[id as usize])
    }

    /// Most characteristic terms of the corpus, by total count times IDF.
    ///
    /// Returns terms sorted by score (highest first).
    pub fn top_terms(&self, n: usize) -> Vec<(String, f32)> {
        let mut scores: Vec<(String, f32)> = self
            .vocabulary
            .iter()
            .map(|(term, &id)| {
                let id = id as usize;
                (term.clone(), self.corpus_counts[id] as f32 * self.idf[id])
            })
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scores.truncate(n);
        scores
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::terms;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts.iter().map(|t| terms(t)).collect()
    }

    #[test]
    fn test_fit_vocabulary() {
        let model = TfIdfModel::fit(&docs(&["rust programming", "python programming"]));
        assert_eq!(model.vocabulary_size(), 3);
    }

    #[test]
    fn test_idf_rare_term_higher() {
        let model = TfIdfModel::fit(&docs(&[
            "frais transfert",
            "frais compte",
            "frais securite",
        ]));
        // frais: ln(4/4)+1 = 1.0, transfert: ln(4/2)+1 = 1.69
        let common = model.idf("frais").unwrap();
        let rare = model.idf("transfert").unwrap();
        assert!((common - 1.0).abs() < 1e-6);
        assert!(rare > common);
        assert!(model.idf("inconnu").is_none());
    }

    #[test]
    fn test_transform_is_normalized() {
        let model = TfIdfModel::fit(&docs(&["frais transaction", "delai transfert"]));
        let v = model.transform(&terms("frais frais transaction"));
        assert!((v.dot(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_out_of_vocabulary_is_zero() {
        let model = TfIdfModel::fit(&docs(&["frais transaction"]));
        let v = model.transform(&terms("bitcoin ethereum"));
        assert!(v.is_zero());
        assert_eq!(v.dot(&model.transform(&terms("frais"))), 0.0);
    }

    #[test]
    fn test_cosine_partial_overlap() {
        let model = TfIdfModel::fit(&docs(&["frais de transaction"]));
        let doc = model.transform(&terms("frais de transaction"));
        let query = model.transform(&terms("Quels sont vos frais ?"));
        // Equal IDF on both terms: cosine = 1/sqrt(2)
        assert!((doc.dot(&query) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_identical_text_scores_one() {
        let model = TfIdfModel::fit(&docs(&["envoyer argent", "recevoir paiement"]));
        let a = model.transform(&terms("envoyer argent"));
        let b = model.transform(&terms("Envoyer de l'argent"));
        assert!((a.dot(&b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_top_terms_sorted() {
        let model = TfIdfModel::fit(&docs(&[
            "transfert transfert transfert frais",
            "compte frais",
            "securite donnees",
        ]));
        let top = model.top_terms(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, "transfert");
        for pair in top.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_empty_corpus() {
        let model = TfIdfModel::fit(&[]);
        assert_eq!(model.vocabulary_size(), 0);
        assert!(model.top_terms(5).is_empty());
        assert!(model.transform(&terms("frais")).is_zero());
    }
}
