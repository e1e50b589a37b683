//! Escalation detection.
//!
//! A query escalates to a human agent when it contains a direct request
//! phrase, or when enough distinct frustration indicators co-occur.

use serde::{Deserialize, Serialize};
use tracing::info;

use assist_index::{contains_keyword, normalize};

/// Phrase tables for escalation detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Any one of these escalates immediately
    pub direct_phrases: Vec<String>,

    /// Signs of frustration; escalate when enough distinct ones co-occur
    pub frustration_indicators: Vec<String>,

    /// Distinct indicators needed to escalate
    pub frustration_threshold: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        let phrases = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            direct_phrases: phrases(&[
                "parler à un humain",
                "parler à une personne",
                "parler à quelqu'un",
                "parler à un conseiller",
                "parler à un agent",
                "agent humain",
                "conseiller humain",
                "vrai humain",
                "vraie personne",
                "urgent",
                "urgence",
                "talk to a human",
                "speak to a human",
                "talk to someone",
                "speak to someone",
                "human agent",
                "real person",
                "customer service",
                "representative",
            ]),
            frustration_indicators: phrases(&[
                "inacceptable",
                "ridicule",
                "nul",
                "marre",
                "énervé",
                "frustré",
                "furieux",
                "scandale",
                "arnaque",
                "toujours pas",
                "n'importe quoi",
                "jamais",
                "unacceptable",
                "ridiculous",
                "useless",
                "frustrated",
                "angry",
                "terrible",
                "scam",
                "still not",
            ]),
            frustration_threshold: 2,
        }
    }
}

/// Detailed outcome of an escalation check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationAssessment {
    pub escalate: bool,

    /// Direct request phrases found
    pub direct_matches: Vec<String>,

    /// Distinct frustration indicators found
    pub frustration_matches: Vec<String>,
}

/// Table-driven escalation detector. Stateless.
pub struct EscalationDetector {
    direct_phrases: Vec<String>,
    frustration_indicators: Vec<String>,
    frustration_threshold: usize,
}

impl EscalationDetector {
    pub fn new() -> Self {
        Self::with_config(EscalationConfig::default())
    }

    pub fn with_config(config: EscalationConfig) -> Self {
        let prepare = |list: Vec<String>| -> Vec<String> {
            let mut prepared: Vec<String> = list
                .iter()
                .map(|p| normalize(p))
                .filter(|p| !p.is_empty())
                .collect();
            prepared.dedup();
            prepared
        };

        Self {
            direct_phrases: prepare(config.direct_phrases),
            frustration_indicators: prepare(config.frustration_indicators),
            frustration_threshold: config.frustration_threshold.max(1),
        }
    }

    /// Returns true if the text must be handed to a human.
    pub fn detect(&self, text: &str) -> bool {
        self.assess(text).escalate
    }

    /// Check the text and report which phrases triggered.
    pub fn assess(&self, text: &str) -> EscalationAssessment {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return EscalationAssessment::default();
        }

        let find = |table: &[String]| -> Vec<String> {
            table
                .iter()
                .filter(|p| contains_keyword(&normalized, p))
                .cloned()
                .collect()
        };

        let direct_matches = find(&self.direct_phrases);
        let frustration_matches = find(&self.frustration_indicators);
        let escalate = !direct_matches.is_empty()
            || frustration_matches.len() >= self.frustration_threshold;

        if escalate {
            info!(
                direct = ?direct_matches,
                frustration = ?frustration_matches,
                "Escalation requested"
            );
        }

        EscalationAssessment {
            escalate,
            direct_matches,
            frustration_matches,
        }
    }
}

impl Default for EscalationDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_phrase_french() {
        let detector = EscalationDetector::new();
        assert!(detector.detect("Je veux parler à un humain"));
        assert!(detector.detect("Je veux PARLER A UN HUMAIN !!!"));
        assert!(detector.detect("C'est urgent"));
    }

    #[test]
    fn test_direct_phrase_english() {
        let detector = EscalationDetector::new();
        assert!(detector.detect("Please let me talk to a human"));
        assert!(detector.detect("I need a real person"));
    }

    #[test]
    fn test_single_frustration_indicator_is_not_enough() {
        let detector = EscalationDetector::new();
        let assessment = detector.assess("Ce délai est ridicule");
        assert!(!assessment.escalate);
        assert_eq!(assessment.frustration_matches, vec!["ridicule".to_string()]);
    }

    #[test]
    fn test_two_frustration_indicators_escalate() {
        let detector = EscalationDetector::new();
        let assessment = detector.assess("C'est inacceptable, j'en ai marre");
        assert!(assessment.escalate);
        assert!(assessment.direct_matches.is_empty());
        assert_eq!(assessment.frustration_matches.len(), 2);
    }

    #[test]
    fn test_plain_questions_do_not_escalate() {
        let detector = EscalationDetector::new();
        assert!(!detector.detect("Quels sont vos frais ?"));
        assert!(!detector.detect("Comment créer un compte ?"));
        assert!(!detector.detect(""));
    }

    #[test]
    fn test_whole_word_matching() {
        // "nul" must match neither inside "annuler" nor as a prefix of "nulle"
        let detector = EscalationDetector::new();
        let assessment = detector.assess("Comment annuler un transfert ? C'est terrible");
        assert!(!assessment.escalate);
        assert_eq!(assessment.frustration_matches, vec!["terrible".to_string()]);

        let assessment = detector.assess("Une réponse nulle, c'est terrible");
        assert!(!assessment.escalate);
        assert_eq!(assessment.frustration_matches, vec!["terrible".to_string()]);
    }

    #[test]
    fn test_custom_threshold() {
        let detector = EscalationDetector::with_config(EscalationConfig {
            direct_phrases: vec![],
            frustration_indicators: vec!["lent".to_string()],
            frustration_threshold: 1,
        });
        assert!(detector.detect("Trop lent"));
        assert!(!detector.detect("Tout va bien"));
    }
}
