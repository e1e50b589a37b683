//! # assist-connectors
//!
//! Collaborators the orchestrator reaches over the network.
//!
//! - [`search`]: [`ExternalSearch`] trait, DuckDuckGo client and a scripted mock
//! - [`generation`]: [`Generator`] trait, OpenAI/Anthropic/Gemini client and a mock
//! - [`error`]: [`ConnectorError`]
//!
//! Both traits are object safe; the orchestrator holds them as
//! `Arc<dyn ExternalSearch>` and `Arc<dyn Generator>`.

pub mod error;
pub mod generation;
pub mod search;

pub use error::ConnectorError;
pub use generation::{ApiGenerator, ApiGeneratorConfig, Generator, MockGenerator};
pub use search::{
    truncate_chars, DuckDuckGoConfig, DuckDuckGoSearch, ExternalResult, ExternalSearch,
    MockExternalSearch, MAX_SNIPPET_CHARS,
};
