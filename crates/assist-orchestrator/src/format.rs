//! Rendering of knowledge-base and external-search answers.

use std::sync::Arc;

use assist_connectors::ExternalResult;
use assist_types::QaEntry;

/// Related questions shown under a knowledge-base answer.
pub const MAX_RELATED: usize = 2;

/// External snippets shown in an external-search answer.
pub const MAX_EXTERNAL_SNIPPETS: usize = 2;

/// Render a knowledge-base answer under its question, followed by up to
/// [`MAX_RELATED`] related questions.
pub fn format_kb_answer(entry: &QaEntry, related: &[Arc<QaEntry>]) -> String {
    let mut text = format!("**{}**\n\n{}", entry.question.trim(), entry.answer.trim());

    let related: Vec<&str> = related
        .iter()
        .map(|e| e.question.trim())
        .filter(|q| !q.is_empty())
        .take(MAX_RELATED)
        .collect();

    if !related.is_empty() {
        text.push_str("\n\n**Vous pourriez aussi demander :**");
        for question in related {
            text.push_str("\n- ");
            text.push_str(question);
        }
    }

    text
}

/// Render external snippets with their sources and a freshness disclaimer.
///
/// Returns `None` when there is nothing to show.
pub fn format_external_answer(results: &[ExternalResult], support_phone: &str) -> Option<String> {
    let shown: Vec<&ExternalResult> = results
        .iter()
        .filter(|r| !r.snippet.trim().is_empty())
        .take(MAX_EXTERNAL_SNIPPETS)
        .collect();

    if shown.is_empty() {
        return None;
    }

    let mut text = String::from("**Informations trouvées en ligne**\n");
    for (i, result) in shown.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, result.snippet.trim()));
        if !result.url.is_empty() {
            text.push_str(&format!("\n   Source : {}", result.url));
        }
    }
    text.push_str(&format!(
        "\n\n*Ces informations proviennent de sources externes et peuvent ne pas \
         refléter nos offres actuelles. Pour une réponse officielle, appelez le {}.*",
        support_phone
    ));

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kb_answer_with_related() {
        let entry = QaEntry::new("1", "Quels sont vos frais ?", "1% minimum 500 F CFA");
        let related = vec![
            Arc::new(QaEntry::new("2", "Quel est le délai ?", "2h")),
            Arc::new(QaEntry::new("3", "Comment payer ?", "Mobile money")),
            Arc::new(QaEntry::new("4", "Troisième ?", "non affichée")),
        ];

        let text = format_kb_answer(&entry, &related);
        assert!(text.starts_with("**Quels sont vos frais ?**\n\n1% minimum 500 F CFA"));
        assert!(text.contains("- Quel est le délai ?"));
        assert!(text.contains("- Comment payer ?"));
        assert!(!text.contains("Troisième"));
    }

    #[test]
    fn test_kb_answer_without_related() {
        let entry = QaEntry::new("1", "Q", "A");
        assert_eq!(format_kb_answer(&entry, &[]), "**Q**\n\nA");
    }

    #[test]
    fn test_external_answer() {
        let results = vec![
            ExternalResult::new("a", "https://a.example", "Premier extrait"),
            ExternalResult::new("b", "", "Deuxième extrait"),
            ExternalResult::new("c", "https://c.example", "Troisième extrait"),
        ];
        let text = format_external_answer(&results, "70 123 456").unwrap();
        assert!(text.contains("1. Premier extrait\n   Source : https://a.example"));
        assert!(text.contains("2. Deuxième extrait"));
        assert!(!text.contains("Troisième"));
        assert!(text.contains("70 123 456"));
    }

    #[test]
    fn test_external_answer_empty() {
        assert!(format_external_answer(&[], "x").is_none());
        let blank = vec![ExternalResult::new("a", "u", "   ")];
        assert!(format_external_answer(&blank, "x").is_none());
    }
}
