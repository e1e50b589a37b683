//! # assist-orchestrator
//!
//! Turns a user query into one answer by layering the knowledge base,
//! the response cache, a time-boxed external search and a generation
//! call, with static templates as the last resort.
//!
//! ## Pipeline
//!
//! 1. Escalation check (short-circuits everything else)
//! 2. Intent classification and topic extraction
//! 3. Knowledge base search
//! 4. Cache or external search, when local confidence is low
//! 5. Generation, when confidence is low or the intent asks for it
//! 6. Local formatting: knowledge base, external results, then template
//! 7. Conversation memory update
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use assist_index::KnowledgeIndex;
//! use assist_orchestrator::Orchestrator;
//! use assist_types::{KnowledgeBase, Settings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let kb = KnowledgeBase::load("knowledge_base.json")?;
//! let index = Arc::new(KnowledgeIndex::build(kb.into_entries()));
//! let orchestrator = Orchestrator::new(index, Settings::default());
//!
//! let result = orchestrator.respond("Quels sont vos frais ?", "user-1").await;
//! println!("[{}] {}", result.source, result.text);
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod memory;
pub mod metrics;
pub mod orchestrator;
pub mod prompt;
pub mod result;
pub mod templates;

pub use format::{format_external_answer, format_kb_answer};
pub use memory::{ConversationMemory, ConversationStats, Exchange};
pub use metrics::{OrchestratorMetrics, OrchestratorMetricsSnapshot};
pub use orchestrator::{Orchestrator, ERROR_CONFIDENCE, ESCALATION_CONFIDENCE};
pub use prompt::{build_prompt, PromptContext};
pub use result::{OrchestrationResult, ResponseSource};
pub use templates::TemplateBook;
