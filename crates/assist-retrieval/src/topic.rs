//! Topic extraction for the rolling conversation window.

use serde::{Deserialize, Serialize};

use assist_index::{contains_keyword, normalize};

/// Fallback topic when no rule matches.
pub const DEFAULT_TOPIC: &str = "general";

/// One topic and the keywords that signal it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Ordered topic rules; the first matching rule wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub rules: Vec<TopicRule>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                TopicRule::new("frais", &["frais", "tarif", "coût", "prix", "combien"]),
                TopicRule::new("delais", &["délai", "temps", "quand", "durée", "rapide"]),
                TopicRule::new(
                    "securite",
                    &["sécurité", "sécuriser", "protéger", "protection", "fraude", "crypté", "données"],
                ),
                TopicRule::new(
                    "compte",
                    &["compte", "profil", "connexion", "mot de passe", "inscription"],
                ),
                TopicRule::new(
                    "transfert",
                    &["transfert", "envoyer", "envoi", "recevoir", "argent", "paiement"],
                ),
            ],
        }
    }
}

/// Table-driven topic detector.
pub struct TopicExtractor {
    rules: Vec<(String, Vec<String>)>,
}

impl TopicExtractor {
    pub fn new() -> Self {
        Self::with_config(TopicConfig::default())
    }

    pub fn with_config(config: TopicConfig) -> Self {
        let rules = config
            .rules
            .into_iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                (rule.name, keywords)
            })
            .collect();
        Self { rules }
    }

    /// Topic of `text`, or [`DEFAULT_TOPIC`].
    pub fn extract(&self, text: &str) -> &str {
        let normalized = normalize(text);
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&normalized, k)))
            .map(|(name, _)| name.as_str())
            .unwrap_or(DEFAULT_TOPIC)
    }
}

impl Default for TopicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topics() {
        let extractor = TopicExtractor::new();
        assert_eq!(extractor.extract("Quels sont vos frais ?"), "frais");
        assert_eq!(extractor.extract("Quel est le délai ?"), "delais");
        assert_eq!(extractor.extract("Est-ce sécurisé contre la fraude ?"), "securite");
        assert_eq!(extractor.extract("J'ai oublié mon mot de passe"), "compte");
        assert_eq!(extractor.extract("Comment envoyer de l'argent ?"), "transfert");
    }

    #[test]
    fn test_general_fallback() {
        let extractor = TopicExtractor::new();
        assert_eq!(extractor.extract("Bonjour"), DEFAULT_TOPIC);
        assert_eq!(extractor.extract(""), DEFAULT_TOPIC);
    }

    #[test]
    fn test_first_rule_wins() {
        // Mentions both fees and transfers
        let extractor = TopicExtractor::new();
        assert_eq!(extractor.extract("Combien coûte un transfert ?"), "frais");
    }

    #[test]
    fn test_custom_rules() {
        let extractor = TopicExtractor::with_config(TopicConfig {
            rules: vec![TopicRule::new("carte", &["carte bancaire", "visa"])],
        });
        assert_eq!(extractor.extract("Payer par carte bancaire"), "carte");
        assert_eq!(extractor.extract("Quels sont vos frais ?"), DEFAULT_TOPIC);
    }
}
