//! Core query types.

use serde::{Deserialize, Serialize};

/// Coarse classification of what the user is asking for.
///
/// Advisory only: it steers whether external context and generation are
/// used, never whether a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Short factual lookup.
    /// Examples: "Quels sont vos frais ?", "Quel est le délai ?"
    SimpleFact,

    /// Asks for an explanation of how or why something works.
    /// Examples: "Pourquoi mon transfert est bloqué ?", "Explique le mécanisme"
    ComplexAnalysis,

    /// Weighs options against each other.
    /// Examples: "Quelle différence avec un virement ?", "Quel est le meilleur ?"
    Comparison,

    /// Reports a problem and wants it fixed.
    /// Examples: "J'ai une erreur", "Le paiement marche pas"
    ProblemSolving,

    /// No keyword family matched.
    #[default]
    General,
}

impl QueryIntent {
    /// All intents, in classification order.
    pub const ALL: [QueryIntent; 5] = [
        QueryIntent::SimpleFact,
        QueryIntent::ComplexAnalysis,
        QueryIntent::Comparison,
        QueryIntent::ProblemSolving,
        QueryIntent::General,
    ];

    /// Returns true if the intent always warrants a generated answer.
    pub fn needs_generation(&self) -> bool {
        matches!(
            self,
            QueryIntent::ComplexAnalysis | QueryIntent::Comparison | QueryIntent::ProblemSolving
        )
    }

    /// Returns true if the intent warrants an external lookup even when
    /// the knowledge base is confident.
    pub fn needs_external_context(&self) -> bool {
        matches!(self, QueryIntent::ComplexAnalysis | QueryIntent::Comparison)
    }

    /// Returns the display name for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::SimpleFact => "simple_fact",
            QueryIntent::ComplexAnalysis => "complex_analysis",
            QueryIntent::Comparison => "comparison",
            QueryIntent::ProblemSolving => "problem_solving",
            QueryIntent::General => "general",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
