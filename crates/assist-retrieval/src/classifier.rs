//! Intent classification for queries.
//!
//! Keyword families are checked in a fixed order (simple fact, complex
//! analysis, comparison, problem solving); the first family with a match
//! wins. Matching runs on normalized text and a keyword matches whole
//! words up to a plural or feminine ending, so `delai` matches "délais"
//! while `vs` does not match "vos" and `contre` does not match "contrer".

use serde::{Deserialize, Serialize};
use tracing::debug;

use assist_index::{contains_keyword, normalize};

use crate::types::QueryIntent;

/// Result of intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The classified intent
    pub intent: QueryIntent,

    /// Keywords of the winning family found in the query
    pub matched_keywords: Vec<String>,

    /// Explanation of why this intent was chosen
    pub reason: String,
}

/// Keyword tables for intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Keywords that indicate a short factual lookup
    pub simple_fact_keywords: Vec<String>,

    /// Keywords that indicate a request for explanation
    pub complex_analysis_keywords: Vec<String>,

    /// Keywords that indicate a comparison
    pub comparison_keywords: Vec<String>,

    /// Keywords that indicate a problem report
    pub problem_solving_keywords: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            simple_fact_keywords: words(&[
                "combien", "quel est", "quels sont", "quelle est", "quelles sont", "frais",
                "tarif", "délai", "temps", "coût", "prix", "how much", "what is", "what are",
                "fee", "cost", "price",
            ]),
            complex_analysis_keywords: words(&[
                "pourquoi", "comment", "explique", "expliquer", "expliquez", "détaillé", "analyse", "comprendre",
                "fonctionne", "mécanisme", "why", "how does", "how do", "explain",
            ]),
            comparison_keywords: words(&[
                "comparer", "comparaison", "différence", "avantage", "inconvénient", "mieux",
                "meilleur", "vs", "contre", "opposé", "compare", "difference", "better",
                "versus",
            ]),
            problem_solving_keywords: words(&[
                "problème", "erreur", "bug", "marche pas", "ne fonctionne pas", "aide",
                "solution", "résoudre", "corriger", "réparer", "bloqué", "problem", "error",
                "not working", "help", "fix",
            ]),
        }
    }
}

/// Intent classifier using keyword heuristics.
pub struct IntentClassifier {
    /// Normalized keyword families in classification order
    families: Vec<(QueryIntent, Vec<String>)>,
}

impl IntentClassifier {
    /// Create a new classifier with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    /// Create a classifier with custom configuration.
    pub fn with_config(config: ClassifierConfig) -> Self {
        let prepare = |keywords: &[String]| -> Vec<String> {
            keywords
                .iter()
                .map(|k| normalize(k))
                .filter(|k| !k.is_empty())
                .collect()
        };

        Self {
            families: vec![
                (QueryIntent::SimpleFact, prepare(&config.simple_fact_keywords)),
                (QueryIntent::ComplexAnalysis, prepare(&config.complex_analysis_keywords)),
                (QueryIntent::Comparison, prepare(&config.comparison_keywords)),
                (QueryIntent::ProblemSolving, prepare(&config.problem_solving_keywords)),
            ],
        }
    }

    /// Classify the intent of a query.
    pub fn classify(&self, query: &str) -> ClassificationResult {
        let normalized = normalize(query);

        for (intent, keywords) in &self.families {
            let matched: Vec<String> = keywords
                .iter()
                .filter(|k| contains_keyword(&normalized, k))
                .cloned()
                .collect();

            if !matched.is_empty() {
                debug!(intent = intent.as_str(), matched = ?matched, "Intent classified");
                return ClassificationResult {
                    intent: *intent,
                    reason: format!(
                        "{} intent: matched keywords [{}]",
                        intent.as_str(),
                        matched.join(", ")
                    ),
                    matched_keywords: matched,
                };
            }
        }

        ClassificationResult {
            intent: QueryIntent::General,
            matched_keywords: Vec::new(),
            reason: "No intent keywords matched; defaulting to general".to_string(),
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_fact() {
        let classifier = IntentClassifier::new();
        let result = classifier.classify("Quels sont vos frais ?");
        assert_eq!(result.intent, QueryIntent::SimpleFact);
        assert!(result.matched_keywords.contains(&"frais".to_string()));
        assert!(result.matched_keywords.contains(&"quels sont".to_string()));
    }

    #[test]
    fn test_complex_analysis() {
        let classifier = IntentClassifier::new();
        let result = classifier.classify("Pourquoi mon transfert est-il suspendu ?");
        assert_eq!(result.intent, QueryIntent::ComplexAnalysis);
    }

    #[test]
    fn test_comparison() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("ZamaPay ou Orange Money, lequel est meilleur ?").intent,
            QueryIntent::Comparison
        );
        assert_eq!(
            classifier.classify("Western Union vs ZamaPay").intent,
            QueryIntent::Comparison
        );
    }

    #[test]
    fn test_problem_solving() {
        let classifier = IntentClassifier::new();
        let result = classifier.classify("J'ai une erreur à la connexion");
        assert_eq!(result.intent, QueryIntent::ProblemSolving);
        assert_eq!(result.matched_keywords, vec!["erreur".to_string()]);
    }

    #[test]
    fn test_general_default() {
        let classifier = IntentClassifier::new();
        let result = classifier.classify("Bonjour");
        assert_eq!(result.intent, QueryIntent::General);
        assert!(result.matched_keywords.is_empty());
        assert!(classifier.classify("").intent == QueryIntent::General);
    }

    #[test]
    fn test_first_family_wins() {
        // Both a fact keyword ("frais") and an analysis keyword ("pourquoi")
        let classifier = IntentClassifier::new();
        let result = classifier.classify("Pourquoi ces frais ?");
        assert_eq!(result.intent, QueryIntent::SimpleFact);
    }

    #[test]
    fn test_word_start_matching() {
        let classifier = IntentClassifier::new();
        // "vs" must not match inside "vos"; "aide" must not match inside "plaideurs"
        assert_eq!(classifier.classify("vos plaideurs").intent, QueryIntent::General);
        // Accents are folded on both sides
        assert_eq!(classifier.classify("Quels DELAIS ?").intent, QueryIntent::SimpleFact);
        // "contre" must not match the verb "contrer"
        assert_eq!(classifier.classify("contrer une fraude").intent, QueryIntent::General);
        assert_eq!(classifier.classify("Orange contre Moov").intent, QueryIntent::Comparison);
    }

    #[test]
    fn test_custom_config() {
        let config = ClassifierConfig {
            simple_fact_keywords: vec![],
            complex_analysis_keywords: vec![],
            comparison_keywords: vec!["lequel".to_string()],
            problem_solving_keywords: vec![],
        };
        let classifier = IntentClassifier::with_config(config);
        assert_eq!(classifier.classify("Lequel choisir ?").intent, QueryIntent::Comparison);
        assert_eq!(classifier.classify("Quels sont vos frais ?").intent, QueryIntent::General);
    }
}
