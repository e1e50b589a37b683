//! # assist-retrieval
//!
//! Query analysis and caching for the support assistant.
//!
//! ## Core Concepts
//!
//! - **Query Intent**: what the user wants (fact, analysis, comparison, troubleshooting)
//! - **Escalation**: whether the user must be handed to a human agent
//! - **Topic**: coarse subject used for the conversation window and templates
//! - **Response Cache**: TTL memo of external lookups keyed by normalized query
//!
//! All classifiers are stateless and driven by keyword tables that can be
//! replaced through their `*Config` types.
//!
//! ## Usage
//!
//! ```rust
//! use assist_retrieval::{EscalationDetector, IntentClassifier, QueryIntent, TopicExtractor};
//!
//! let query = "Quels sont vos frais ?";
//! assert!(!EscalationDetector::new().detect(query));
//! assert_eq!(IntentClassifier::new().classify(query).intent, QueryIntent::SimpleFact);
//! assert_eq!(TopicExtractor::new().extract(query), "frais");
//! ```

pub mod cache;
pub mod classifier;
pub mod escalation;
pub mod topic;
pub mod types;

pub use cache::{Clock, ResponseCache, DEFAULT_TTL};
pub use classifier::{ClassificationResult, ClassifierConfig, IntentClassifier};
pub use escalation::{EscalationAssessment, EscalationConfig, EscalationDetector};
pub use topic::{TopicConfig, TopicExtractor, TopicRule, DEFAULT_TOPIC};
pub use types::QueryIntent;
