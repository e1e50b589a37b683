//! Error types for the support-assist system.

use thiserror::Error;

/// Unified error type for configuration and knowledge-base operations.
#[derive(Debug, Error)]
pub enum AssistError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (reading or writing the knowledge-base file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The knowledge-base document has an unusable shape
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
