//! Response counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::result::ResponseSource;

/// Counters for answered requests and degraded stages.
#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    pub escalation: AtomicU64,
    pub knowledge_base: AtomicU64,
    pub cache: AtomicU64,
    pub external_search: AtomicU64,
    pub generation: AtomicU64,
    pub template_fallback: AtomicU64,
    pub error: AtomicU64,
    pub external_timeouts: AtomicU64,
    pub external_failures: AtomicU64,
    pub generation_failures: AtomicU64,
    pub request_timeouts: AtomicU64,
}

impl OrchestratorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one response from `source`.
    pub fn record(&self, source: ResponseSource) {
        let counter = match source {
            ResponseSource::Escalation => &self.escalation,
            ResponseSource::KnowledgeBase => &self.knowledge_base,
            ResponseSource::Cache => &self.cache,
            ResponseSource::ExternalSearch => &self.external_search,
            ResponseSource::Generation => &self.generation,
            ResponseSource::TemplateFallback => &self.template_fallback,
            ResponseSource::Error => &self.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counts as a snapshot.
    pub fn snapshot(&self) -> OrchestratorMetricsSnapshot {
        OrchestratorMetricsSnapshot {
            escalation: self.escalation.load(Ordering::Relaxed),
            knowledge_base: self.knowledge_base.load(Ordering::Relaxed),
            cache: self.cache.load(Ordering::Relaxed),
            external_search: self.external_search.load(Ordering::Relaxed),
            generation: self.generation.load(Ordering::Relaxed),
            template_fallback: self.template_fallback.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
            external_timeouts: self.external_timeouts.load(Ordering::Relaxed),
            external_failures: self.external_failures.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            request_timeouts: self.request_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of orchestrator metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorMetricsSnapshot {
    pub escalation: u64,
    pub knowledge_base: u64,
    pub cache: u64,
    pub external_search: u64,
    pub generation: u64,
    pub template_fallback: u64,
    pub error: u64,
    pub external_timeouts: u64,
    pub external_failures: u64,
    pub generation_failures: u64,
    pub request_timeouts: u64,
}

impl OrchestratorMetricsSnapshot {
    /// Responses counted for one source.
    pub fn responses_from(&self, source: ResponseSource) -> u64 {
        match source {
            ResponseSource::Escalation => self.escalation,
            ResponseSource::KnowledgeBase => self.knowledge_base,
            ResponseSource::Cache => self.cache,
            ResponseSource::ExternalSearch => self.external_search,
            ResponseSource::Generation => self.generation,
            ResponseSource::TemplateFallback => self.template_fallback,
            ResponseSource::Error => self.error,
        }
    }

    /// Total responses over all sources.
    pub fn total_responses(&self) -> u64 {
        ResponseSource::ALL
            .iter()
            .map(|s| self.responses_from(*s))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = OrchestratorMetrics::new();
        metrics.record(ResponseSource::KnowledgeBase);
        metrics.record(ResponseSource::KnowledgeBase);
        metrics.record(ResponseSource::Error);
        metrics.external_timeouts.fetch_add(1, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.knowledge_base, 2);
        assert_eq!(snapshot.responses_from(ResponseSource::Error), 1);
        assert_eq!(snapshot.external_timeouts, 1);
        assert_eq!(snapshot.total_responses(), 3);
    }

    #[test]
    fn test_every_source_has_a_counter() {
        let metrics = OrchestratorMetrics::new();
        for source in ResponseSource::ALL {
            metrics.record(source);
        }
        let snapshot = metrics.snapshot();
        for source in ResponseSource::ALL {
            assert_eq!(snapshot.responses_from(source), 1, "{source}");
        }
        assert_eq!(snapshot.total_responses(), ResponseSource::ALL.len() as u64);
    }
}
