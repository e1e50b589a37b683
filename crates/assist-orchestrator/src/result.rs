//! Response types returned by the orchestrator.

use serde::{Deserialize, Serialize};

use assist_retrieval::QueryIntent;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Handed to a human agent
    Escalation,
    /// Curated knowledge-base answer
    KnowledgeBase,
    /// External search results served from the response cache
    Cache,
    /// Fresh external search results
    ExternalSearch,
    /// Text produced by the generation service
    Generation,
    /// Static template
    TemplateFallback,
    /// Internal fault
    Error,
}

impl ResponseSource {
    pub const ALL: [ResponseSource; 7] = [
        ResponseSource::Escalation,
        ResponseSource::KnowledgeBase,
        ResponseSource::Cache,
        ResponseSource::ExternalSearch,
        ResponseSource::Generation,
        ResponseSource::TemplateFallback,
        ResponseSource::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Escalation => "escalation",
            ResponseSource::KnowledgeBase => "knowledge_base",
            ResponseSource::Cache => "cache",
            ResponseSource::ExternalSearch => "external_search",
            ResponseSource::Generation => "generation",
            ResponseSource::TemplateFallback => "template_fallback",
            ResponseSource::Error => "error",
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final answer for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub text: String,

    /// Confidence in [0, 1]
    pub confidence: f32,

    pub source: ResponseSource,

    /// Classified intent (absent for escalations and errors)
    pub intent: Option<QueryIntent>,

    /// Detected topic
    pub topic: Option<String>,

    /// Wall-clock time spent answering
    pub elapsed_ms: u64,
}

impl OrchestrationResult {
    pub fn new(text: impl Into<String>, confidence: f32, source: ResponseSource) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            intent: None,
            topic: None,
            elapsed_ms: 0,
        }
    }

    pub fn with_intent(mut self, intent: QueryIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}
