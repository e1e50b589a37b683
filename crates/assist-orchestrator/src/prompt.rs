//! Generation prompt construction.

use assist_connectors::{truncate_chars, ExternalResult};
use assist_index::SearchResult;
use assist_retrieval::QueryIntent;
use assist_types::SupportContact;

/// Knowledge-base answers and external snippets embedded in a prompt.
const MAX_CONTEXT_ITEMS: usize = 2;

/// Longest external snippet embedded in a prompt, in characters.
const MAX_PROMPT_SNIPPET_CHARS: usize = 300;

/// Everything the prompt is built from.
pub struct PromptContext<'a> {
    pub query: &'a str,
    pub intent: QueryIntent,
    pub kb_results: &'a [SearchResult],
    pub external_results: &'a [ExternalResult],
    /// Most recent first
    pub recent_topics: &'a [String],
    pub contact: &'a SupportContact,
}

fn instruction(intent: QueryIntent, phone: &str) -> String {
    match intent {
        QueryIntent::SimpleFact => {
            "Donne une réponse courte et factuelle. Précise les montants et les délais \
             quand ils sont connus."
                .to_string()
        }
        QueryIntent::ComplexAnalysis => {
            "Explique en détail et de façon structurée, avec des sections claires. \
             Décris le fonctionnement étape par étape."
                .to_string()
        }
        QueryIntent::Comparison => {
            "Compare les options de façon équilibrée : frais, délais, sécurité et \
             fonctionnalités. Termine par une recommandation."
                .to_string()
        }
        QueryIntent::ProblemSolving => format!(
            "Propose une procédure de résolution numérotée. Si le problème persiste, \
             oriente vers le support au {phone}."
        ),
        QueryIntent::General => format!(
            "Réponds de manière utile et professionnelle. Si la question est hors sujet, \
             redirige gentiment vers le support au {phone}."
        ),
    }
}

/// Build the generation prompt for one query.
pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let c = ctx.contact;
    let mut prompt = format!(
        "Tu es l'assistant du service client de {brand}, une plateforme de transfert d'argent.\n\
         Devise : {currency}. Support : {phone}, {email} ({hours}).\n",
        brand = c.brand,
        currency = c.currency,
        phone = c.phone,
        email = c.email,
        hours = c.hours
    );

    if !ctx.kb_results.is_empty() {
        prompt.push_str("\nInformations de la base de connaissances :\n");
        for (i, result) in ctx.kb_results.iter().take(MAX_CONTEXT_ITEMS).enumerate() {
            prompt.push_str(&format!(
                "{}. {} {}\n",
                i + 1,
                result.entry.question.trim(),
                result.entry.answer.trim()
            ));
        }
    }

    if !ctx.external_results.is_empty() {
        prompt.push_str("\nInformations web récentes :\n");
        for (i, result) in ctx.external_results.iter().take(MAX_CONTEXT_ITEMS).enumerate() {
            prompt.push_str(&format!(
                "{}. {}\n",
                i + 1,
                truncate_chars(result.snippet.trim(), MAX_PROMPT_SNIPPET_CHARS)
            ));
        }
    }

    if !ctx.recent_topics.is_empty() {
        prompt.push_str(&format!(
            "\nSujets récents de la conversation : {}\n",
            ctx.recent_topics.join(", ")
        ));
    }

    prompt.push_str(&format!(
        "\nQUESTION : {}\n\n{}\nRéponds en français, de façon concise, chaleureuse et \
         professionnelle. Si tu ne sais pas, oriente vers le support au {}.\n",
        ctx.query.trim(),
        instruction(ctx.intent, &c.phone),
        c.phone
    ));

    prompt
}
