//! # assist-index
//!
//! Keyword similarity search over the curated knowledge base.
//!
//! - [`text`]: normalization and tokenization shared by every matcher
//! - [`tfidf`]: vocabulary, IDF weights and sparse vectors
//! - [`index`]: [`KnowledgeIndex`] and the [`KnowledgeSearch`] trait
//!
//! ## Usage
//!
//! ```rust
//! use assist_index::KnowledgeIndex;
//! use assist_types::QaEntry;
//!
//! let index = KnowledgeIndex::build(vec![
//!     QaEntry::new("1", "frais de transaction", "1% minimum 500 F CFA"),
//! ]);
//! let results = index.search("Quels sont vos frais ?", 3, 0.3);
//! assert_eq!(results[0].entry.id.as_str(), "1");
//! ```

pub mod index;
pub mod text;
pub mod tfidf;

pub use index::{BuildReport, KnowledgeIndex, KnowledgeSearch, MatchType, SearchResult, SkipReason};
pub use text::{contains_keyword, normalize, terms, tokenize};
pub use tfidf::{SparseVector, TfIdfModel};
