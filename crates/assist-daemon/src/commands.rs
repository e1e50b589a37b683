//! Command implementations for support-assist.
//!
//! Handles:
//! - ask: answer one question
//! - chat: interactive loop for one user
//! - kb check / kb search: knowledge base diagnostics
//! - classify: escalation, intent and topic report

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use assist_connectors::{ApiGenerator, ApiGeneratorConfig, DuckDuckGoConfig, DuckDuckGoSearch};
use assist_index::KnowledgeIndex;
use assist_orchestrator::{OrchestrationResult, Orchestrator};
use assist_retrieval::{EscalationDetector, IntentClassifier, TopicExtractor};
use assist_types::{KnowledgeBase, Settings};

use crate::cli::KbCommands;

/// Overrides taken from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<String>,
    pub log_level: Option<String>,
    pub knowledge_base: Option<String>,
    pub offline: bool,
}

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(overrides: &Overrides) -> Result<Settings> {
    let mut settings =
        Settings::load(overrides.config_path.as_deref()).context("Failed to load configuration")?;

    if let Some(path) = &overrides.knowledge_base {
        settings.knowledge_base_path = path.clone();
    }
    if let Some(level) = &overrides.log_level {
        settings.log_level = level.clone();
    }
    if overrides.offline {
        settings.external_search.enabled = false;
        settings.generation.enabled = false;
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the tracing subscriber. Logs go to stderr so answers stay on stdout.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Load the knowledge base file and build the index.
pub fn build_index(path: &Path) -> Result<(KnowledgeBase, KnowledgeIndex)> {
    let kb = KnowledgeBase::load(path)
        .with_context(|| format!("Failed to load knowledge base {}", path.display()))?;
    for skipped in kb.skipped() {
        warn!(
            position = skipped.position,
            reason = %skipped.reason,
            "Knowledge base entry skipped"
        );
    }
    let index = KnowledgeIndex::build(kb.entries().iter().cloned());
    Ok((kb, index))
}

/// Build an orchestrator with the connectors enabled in `settings`.
///
/// Generation without an API key is disabled with a warning rather than
/// failing startup.
pub fn build_orchestrator(settings: &Settings) -> Result<Orchestrator> {
    let path = settings.expanded_knowledge_base_path();
    let (_, index) = build_index(&path)?;
    info!(
        path = %path.display(),
        entries = index.len(),
        vectors = index.vector_count(),
        "Knowledge base indexed"
    );

    let mut orchestrator = Orchestrator::new(Arc::new(index), settings.clone());

    if settings.external_search.enabled {
        let search = DuckDuckGoSearch::new(DuckDuckGoConfig::from_settings(
            &settings.external_search,
        ))
        .context("Failed to create external search client")?;
        orchestrator = orchestrator.with_external_search(Arc::new(search));
    }

    if settings.generation.enabled {
        match ApiGeneratorConfig::from_settings(&settings.generation) {
            Ok(config) => {
                let generator =
                    ApiGenerator::new(config).context("Failed to create generation client")?;
                orchestrator = orchestrator.with_generator(Arc::new(generator));
            }
            Err(e) => warn!(error = %e, "Generation disabled"),
        }
    }

    Ok(orchestrator)
}

fn print_result(result: &OrchestrationResult) {
    println!("{}", result.text);
    println!(
        "\n[source: {} | confidence: {:.2} | {} ms]",
        result.source, result.confidence, result.elapsed_ms
    );
}

/// Answer one question.
pub async fn handle_ask(settings: &Settings, question: &str, user: &str, json: bool) -> Result<()> {
    let orchestrator = build_orchestrator(settings)?;
    let result = orchestrator.respond(question, user).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        print_result(&result);
    }
    Ok(())
}

/// Interactive loop for one user until EOF or /quit.
pub async fn handle_chat(settings: &Settings, user: &str) -> Result<()> {
    let orchestrator = build_orchestrator(settings)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{} - tapez /stats, /clear ou /quit", settings.support.brand);

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/stats" => {
                let stats = orchestrator.conversation_stats(user).await;
                println!("Messages: {}", stats.message_count);
                println!("Recent topics: {}", stats.topics.join(", "));
                println!("Cached queries: {}", orchestrator.cached_queries());
                println!(
                    "{}",
                    serde_json::to_string_pretty(&orchestrator.metrics().snapshot())
                        .context("Failed to serialize metrics")?
                );
            }
            "/clear" => {
                if orchestrator.clear_conversation(user).await {
                    println!("Conversation cleared");
                } else {
                    println!("Nothing to clear");
                }
            }
            question => {
                let result = orchestrator.respond(question, user).await;
                print_result(&result);
            }
        }
    }

    Ok(())
}

/// Knowledge base diagnostics.
pub fn handle_kb(settings: &Settings, command: KbCommands) -> Result<()> {
    let path = settings.expanded_knowledge_base_path();
    let (kb, index) = build_index(&path)?;

    match command {
        KbCommands::Check { terms } => {
            let report = index.report();
            println!("Knowledge base: {}", path.display());
            println!("  Entries loaded:  {}", kb.len());
            println!("  Rejected (file): {}", kb.skipped().len());
            for skipped in kb.skipped() {
                println!("    #{}: {}", skipped.position, skipped.reason);
            }
            println!("  Indexed:         {}", report.indexed);
            println!("  Vectors:         {}", report.vectors);
            println!("  Vocabulary:      {}", report.vocabulary);
            println!("  Skipped (index): {}", report.skipped.len());
            for (id, reason) in &report.skipped {
                println!("    {}: {:?}", id, reason);
            }
            if terms > 0 {
                println!("  Top terms:");
                for (term, weight) in index.top_terms(terms) {
                    println!("    {:<20} {:.2}", term, weight);
                }
            }
        }
        KbCommands::Search {
            query,
            top_k,
            min_score,
        } => {
            let min_score = min_score.unwrap_or(settings.search.min_score);
            let results = index.search(&query, top_k, min_score);
            if results.is_empty() {
                println!("No match (min score {:.2})", min_score);
            }
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{}. [{:.3}] ({}) #{} {}",
                    rank + 1,
                    result.score,
                    result.match_type.as_str(),
                    result.entry.id,
                    result.entry.question
                );
            }
        }
    }

    Ok(())
}

/// Print the escalation, intent and topic analysis of a text.
pub fn handle_classify(text: &str) {
    let escalation = EscalationDetector::new().assess(text);
    let classification = IntentClassifier::new().classify(text);
    let topic = TopicExtractor::new().extract(text).to_string();

    println!("Escalate: {}", escalation.escalate);
    if !escalation.direct_matches.is_empty() {
        println!("  Direct phrases: {}", escalation.direct_matches.join(", "));
    }
    if !escalation.frustration_matches.is_empty() {
        println!(
            "  Frustration indicators: {}",
            escalation.frustration_matches.join(", ")
        );
    }
    println!("Intent: {}", classification.intent);
    println!("  {}", classification.reason);
    println!("Topic: {}", topic);
}
