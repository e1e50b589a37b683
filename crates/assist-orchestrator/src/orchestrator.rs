//! Layered response pipeline.
//!
//! `respond` runs escalation detection, intent classification, knowledge
//! base search, an optional time-boxed external lookup (through the
//! response cache) and an optional generation call, then formats the best
//! available answer and records the exchange in conversation memory.
//!
//! Failure handling:
//! - External search errors and deadline expiry drop that source
//! - Generation errors and blank output fall back to local formatting
//! - Panics anywhere in the pipeline become the fixed error response
//! - The request-level timeout degrades to the template response
//!
//! `respond` never returns an error.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use assist_connectors::{ExternalResult, ExternalSearch, Generator};
use assist_index::{KnowledgeSearch, SearchResult};
use assist_retrieval::{
    Clock, EscalationDetector, IntentClassifier, QueryIntent, ResponseCache, TopicExtractor,
};
use assist_types::Settings;

use crate::format::{format_external_answer, format_kb_answer};
use crate::memory::{ConversationMemory, ConversationStats, Exchange};
use crate::metrics::OrchestratorMetrics;
use crate::prompt::{build_prompt, PromptContext};
use crate::result::{OrchestrationResult, ResponseSource};
use crate::templates::TemplateBook;

/// Confidence reported for escalations.
pub const ESCALATION_CONFIDENCE: f32 = 0.95;

/// Confidence reported for internal faults.
pub const ERROR_CONFIDENCE: f32 = 0.1;

/// Outcome of the cache/external stage.
enum ExternalLookup {
    /// Stage not reached
    Skipped,
    /// No search configured, search failed or deadline expired
    Unavailable,
    Cached(Vec<ExternalResult>),
    Fresh(Vec<ExternalResult>),
}

impl ExternalLookup {
    fn results(&self) -> &[ExternalResult] {
        match self {
            ExternalLookup::Cached(results) | ExternalLookup::Fresh(results) => results,
            ExternalLookup::Skipped | ExternalLookup::Unavailable => &[],
        }
    }

    fn source(&self) -> ResponseSource {
        match self {
            ExternalLookup::Cached(_) => ResponseSource::Cache,
            _ => ResponseSource::ExternalSearch,
        }
    }
}

/// Composes the retrieval sources into one answer per query.
///
/// Shared behind `Arc` across concurrent requests; the cache and memory
/// are internally synchronized.
pub struct Orchestrator {
    knowledge: Arc<dyn KnowledgeSearch>,
    external: Option<Arc<dyn ExternalSearch>>,
    generator: Option<Arc<dyn Generator>>,
    settings: Settings,
    classifier: IntentClassifier,
    escalation: EscalationDetector,
    topics: TopicExtractor,
    cache: ResponseCache<Vec<ExternalResult>>,
    memory: ConversationMemory,
    templates: TemplateBook,
    metrics: Arc<OrchestratorMetrics>,
}

impl Orchestrator {
    /// Create an orchestrator over a knowledge source with no external
    /// search and no generator.
    pub fn new(knowledge: Arc<dyn KnowledgeSearch>, settings: Settings) -> Self {
        Self {
            knowledge,
            external: None,
            generator: None,
            classifier: IntentClassifier::new(),
            escalation: EscalationDetector::new(),
            topics: TopicExtractor::new(),
            cache: ResponseCache::new(Duration::from_secs(settings.cache.ttl_secs)),
            memory: ConversationMemory::new(&settings.memory),
            templates: TemplateBook::new(settings.support.clone()),
            metrics: Arc::new(OrchestratorMetrics::new()),
            settings,
        }
    }

    pub fn with_external_search(mut self, search: Arc<dyn ExternalSearch>) -> Self {
        self.external = Some(search);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the response cache clock. Discards cached entries.
    pub fn with_cache_clock(mut self, clock: Clock) -> Self {
        self.cache =
            ResponseCache::with_clock(Duration::from_secs(self.settings.cache.ttl_secs), clock);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Queries with cached external results, expired ones included until
    /// the next purge.
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    /// Get metrics for this orchestrator.
    pub fn metrics(&self) -> Arc<OrchestratorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub async fn conversation_stats(&self, user_id: &str) -> ConversationStats {
        self.memory.stats(user_id).await
    }

    /// Stored exchanges for a user, oldest first.
    pub async fn history(&self, user_id: &str) -> Vec<Exchange> {
        self.memory.history(user_id).await
    }

    /// Forget a user's conversation. Returns true if there was one.
    pub async fn clear_conversation(&self, user_id: &str) -> bool {
        self.memory.clear(user_id).await
    }

    /// Answer one query for one user.
    pub async fn respond(&self, query: &str, user_id: &str) -> OrchestrationResult {
        let started = Instant::now();
        let topic = self.topics.extract(query).to_string();
        let budget = Duration::from_millis(self.settings.request_timeout_ms);

        let pipeline = AssertUnwindSafe(self.run_pipeline(query, user_id, &topic)).catch_unwind();

        let result = match timeout(budget, pipeline).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                error!(
                    user_id,
                    panic = panic_message(&*panic),
                    "Pipeline fault, returning error response"
                );
                OrchestrationResult::new(
                    self.templates.error(),
                    ERROR_CONFIDENCE,
                    ResponseSource::Error,
                )
            }
            Err(_) => {
                warn!(
                    user_id,
                    timeout_ms = self.settings.request_timeout_ms,
                    "Request timed out, degrading to template"
                );
                self.metrics.request_timeouts.fetch_add(1, Ordering::Relaxed);
                let intent = self.classifier.classify(query).intent;
                self.template_result(query, intent, &topic)
            }
        };

        let mut result = result.with_topic(topic.clone());
        result.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.metrics.record(result.source);
        self.memory
            .record(
                user_id,
                &topic,
                Exchange::new(query, result.text.clone(), result.source, result.confidence),
            )
            .await;

        info!(
            user_id,
            source = result.source.as_str(),
            confidence = result.confidence,
            topic = %topic,
            elapsed_ms = result.elapsed_ms,
            "Responded"
        );

        result
    }

    async fn run_pipeline(&self, query: &str, user_id: &str, topic: &str) -> OrchestrationResult {
        let assessment = self.escalation.assess(query);
        if assessment.escalate {
            info!(
                user_id,
                direct = ?assessment.direct_matches,
                frustration = ?assessment.frustration_matches,
                "Escalating to a human agent"
            );
            return OrchestrationResult::new(
                self.templates.escalation(),
                ESCALATION_CONFIDENCE,
                ResponseSource::Escalation,
            );
        }

        let intent = self.classifier.classify(query).intent;

        let kb_results = self.knowledge.search(
            query,
            self.settings.search.top_k,
            self.settings.search.min_score,
        );
        let best = kb_results.first().map(|r| r.score).unwrap_or(0.0);
        debug!(
            intent = intent.as_str(),
            topic,
            kb_results = kb_results.len(),
            best_score = best,
            "Knowledge base searched"
        );

        let thresholds = &self.settings.thresholds;

        let external = if best < thresholds.external_search_below || intent.needs_external_context()
        {
            self.lookup_external(query).await
        } else {
            ExternalLookup::Skipped
        };

        let should_generate = kb_results.is_empty()
            || best < thresholds.generation_below
            || intent.needs_generation();
        if should_generate {
            if let Some(text) = self
                .generate(query, user_id, intent, &kb_results, external.results())
                .await
            {
                return OrchestrationResult::new(
                    text,
                    thresholds.generation_confidence,
                    ResponseSource::Generation,
                )
                .with_intent(intent);
            }
        }

        self.format_local(query, intent, topic, &kb_results, &external)
            .with_intent(intent)
    }

    /// Serve external results from the cache, or run the search on its own
    /// task under the configured deadline.
    async fn lookup_external(&self, query: &str) -> ExternalLookup {
        let Some(search) = self.external.as_ref() else {
            return ExternalLookup::Unavailable;
        };

        if let Some(results) = self.cache.get(query) {
            debug!(results = results.len(), "External results served from cache");
            return ExternalLookup::Cached(results);
        }

        let deadline = Duration::from_millis(self.settings.external_search.deadline_ms);
        let limit = self.settings.external_search.max_results;
        let cancel = CancellationToken::new();
        // Cancels the search on every exit, including the request budget
        // dropping this future mid-wait
        let _cancel_guard = cancel.clone().drop_guard();

        let task = {
            let search = Arc::clone(search);
            let cancel = cancel.clone();
            let query = query.to_string();
            tokio::spawn(async move { search.search(&query, limit, cancel).await })
        };

        match timeout(deadline, task).await {
            Ok(Ok(Ok(results))) => {
                debug!(
                    search = search.name(),
                    results = results.len(),
                    "External search completed"
                );
                let purged = self.cache.purge_expired();
                if purged > 0 {
                    debug!(purged, "Expired cache entries removed");
                }
                self.cache.put(query, results.clone());
                ExternalLookup::Fresh(results)
            }
            Ok(Ok(Err(e))) => {
                warn!(search = search.name(), error = %e, "External search failed");
                self.metrics.external_failures.fetch_add(1, Ordering::Relaxed);
                ExternalLookup::Unavailable
            }
            Ok(Err(e)) => {
                warn!(search = search.name(), error = %e, "External search task aborted");
                self.metrics.external_failures.fetch_add(1, Ordering::Relaxed);
                ExternalLookup::Unavailable
            }
            Err(_) => {
                // Dropping the handle detaches the task; the guard stops it
                warn!(
                    search = search.name(),
                    deadline_ms = self.settings.external_search.deadline_ms,
                    "External search deadline expired"
                );
                self.metrics.external_timeouts.fetch_add(1, Ordering::Relaxed);
                ExternalLookup::Unavailable
            }
        }
    }

    async fn generate(
        &self,
        query: &str,
        user_id: &str,
        intent: QueryIntent,
        kb_results: &[SearchResult],
        external_results: &[ExternalResult],
    ) -> Option<String> {
        let generator = self.generator.as_ref()?;

        let recent_topics = self.memory.recent_topics(user_id).await;
        let prompt = build_prompt(&PromptContext {
            query,
            intent,
            kb_results,
            external_results,
            recent_topics: &recent_topics,
            contact: self.templates.contact(),
        });

        match generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("Generation returned blank text, formatting locally");
                self.metrics.generation_failures.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, formatting locally");
                self.metrics.generation_failures.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn format_local(
        &self,
        query: &str,
        intent: QueryIntent,
        topic: &str,
        kb_results: &[SearchResult],
        external: &ExternalLookup,
    ) -> OrchestrationResult {
        let thresholds = &self.settings.thresholds;

        if let Some(best) = kb_results.first() {
            if best.score >= thresholds.kb_answer_min {
                let related: Vec<_> = best
                    .entry
                    .related_ids
                    .iter()
                    .filter(|id| **id != best.entry.id)
                    .filter_map(|id| self.knowledge.get(id))
                    .collect();
                return OrchestrationResult::new(
                    format_kb_answer(&best.entry, &related),
                    best.score,
                    ResponseSource::KnowledgeBase,
                );
            }
        }

        if let Some(text) = format_external_answer(external.results(), &self.templates.contact().phone)
        {
            return OrchestrationResult::new(text, thresholds.external_confidence, external.source());
        }

        self.template_result(query, intent, topic)
    }

    fn template_result(&self, query: &str, intent: QueryIntent, topic: &str) -> OrchestrationResult {
        OrchestrationResult::new(
            self.templates.select(query, intent, topic),
            self.settings.thresholds.template_confidence,
            ResponseSource::TemplateFallback,
        )
        .with_intent(intent)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
