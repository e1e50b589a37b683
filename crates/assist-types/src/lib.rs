//! # assist-types
//!
//! Shared domain types for the support assistant.
//!
//! - [`qa`]: question/answer entries and the knowledge-base file format
//! - [`config`]: layered settings (defaults, file, environment)
//! - [`error`]: the shared error type
//!
//! ## Usage
//!
//! ```rust
//! use assist_types::{KnowledgeBase, QaEntry};
//!
//! let kb = KnowledgeBase::new(vec![QaEntry::new("1", "Quels sont vos frais ?", "1%")]);
//! assert_eq!(kb.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod qa;

pub use config::{
    CacheSettings, ExternalSearchSettings, GenerationProvider, GenerationSettings,
    MemorySettings, SearchSettings, Settings, SupportContact, ThresholdSettings,
    HISTORY_LIMIT_RANGE, MAX_RECENT_TOPICS, MAX_TEMPLATE_CONFIDENCE,
};
pub use error::AssistError;
pub use qa::{KnowledgeBase, QaEntry, QaId, SkippedEntry};
