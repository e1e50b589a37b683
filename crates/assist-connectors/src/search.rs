//! External web search.
//!
//! [`ExternalSearch`] is the narrow seam the orchestrator calls under a
//! deadline. [`DuckDuckGoSearch`] queries the DuckDuckGo Instant Answer API;
//! [`MockExternalSearch`] is a scripted stand-in for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use assist_types::ExternalSearchSettings;

use crate::error::{ensure_success, ConnectorError};

/// Longest snippet kept from a search result, in characters.
pub const MAX_SNIPPET_CHARS: usize = 500;

/// One snippet returned by an external search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl ExternalResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        let snippet: String = snippet.into();
        Self {
            title: title.into(),
            url: url.into(),
            snippet: truncate_chars(&snippet, MAX_SNIPPET_CHARS),
        }
    }
}

/// Best-effort lookup of external context.
///
/// Implementations should return promptly once `cancel` fires; the caller
/// has already stopped waiting by then.
#[async_trait]
pub trait ExternalSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<ExternalResult>, ConnectorError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "external"
    }
}

/// Cut `text` to at most `max` characters, on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Configuration for [`DuckDuckGoSearch`].
#[derive(Debug, Clone)]
pub struct DuckDuckGoConfig {
    /// API base URL (e.g., "https://api.duckduckgo.com")
    pub base_url: String,

    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self::from_settings(&ExternalSearchSettings::default())
    }
}

impl DuckDuckGoConfig {
    pub fn from_settings(settings: &ExternalSearchSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a topic (`Text` + `FirstURL`) or a named group of topics.
#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    #[serde(rename = "Topics", default)]
    topics: Vec<RelatedTopic>,
}

/// DuckDuckGo Instant Answer client.
pub struct DuckDuckGoSearch {
    client: Client,
    config: DuckDuckGoConfig,
}

impl DuckDuckGoSearch {
    pub fn new(config: DuckDuckGoConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("support-assist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn fetch(&self, query: &str) -> Result<InstantAnswer, ConnectorError> {
        let response = self
            .client
            .get(format!("{}/", self.config.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        let response = ensure_success(response).await?;
        // Served as application/x-javascript, so decode the text ourselves
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ConnectorError::ParseError(e.to_string()))
    }
}

fn collect_results(answer: InstantAnswer, limit: usize) -> Vec<ExternalResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.trim().is_empty() {
        let title = if answer.heading.is_empty() {
            "DuckDuckGo".to_string()
        } else {
            answer.heading.clone()
        };
        results.push(ExternalResult::new(
            title,
            answer.abstract_url.clone(),
            answer.abstract_text.trim(),
        ));
    }

    let mut stack: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
    while let Some(topic) = stack.pop() {
        if results.len() >= limit {
            break;
        }
        if !topic.topics.is_empty() {
            stack.extend(topic.topics.into_iter().rev());
            continue;
        }
        let text = topic.text.trim();
        if text.is_empty() {
            continue;
        }
        // Topic text starts with the entity name, up to the first " - "
        let title = text.split(" - ").next().unwrap_or(text);
        results.push(ExternalResult::new(title, topic.first_url.clone(), text));
    }

    results.truncate(limit);
    results
}

#[async_trait]
impl ExternalSearch for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<ExternalResult>, ConnectorError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(ConnectorError::Cancelled);
        }

        let answer = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("External search cancelled");
                return Err(ConnectorError::Cancelled);
            }
            answer = self.fetch(query) => answer,
        };

        match answer {
            Ok(answer) => {
                let results = collect_results(answer, limit);
                debug!(results = results.len(), "External search completed");
                Ok(results)
            }
            Err(e) => {
                warn!(error = %e, "External search failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Scripted external search for tests.
///
/// Counts calls and cancellations so tests can assert on orchestration.
pub struct MockExternalSearch {
    results: Vec<ExternalResult>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
    cancellations: AtomicUsize,
}

impl MockExternalSearch {
    /// Mock that returns no results.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
            cancellations: AtomicUsize::new(0),
        }
    }

    /// Return these results (trimmed to the requested limit).
    pub fn with_results(mut self, results: Vec<ExternalResult>) -> Self {
        self.results = results;
        self
    }

    /// Wait this long before answering, unless cancelled.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Always fail with an API error.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls that observed cancellation.
    pub fn cancellation_count(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl Default for MockExternalSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalSearch for MockExternalSearch {
    async fn search(
        &self,
        _query: &str,
        limit: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<ExternalResult>, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.cancellations.fetch_add(1, Ordering::SeqCst);
                    return Err(ConnectorError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self.fail {
            return Err(ConnectorError::ApiError("mock search failure".to_string()));
        }

        Ok(self.results.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DuckDuckGoSearch {
        DuckDuckGoSearch::new(DuckDuckGoConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("délai", 3), "dél");
        assert_eq!(truncate_chars("abc", 10), "abc");
        let long = "é".repeat(MAX_SNIPPET_CHARS + 20);
        let result = ExternalResult::new("t", "u", long);
        assert_eq!(result.snippet.chars().count(), MAX_SNIPPET_CHARS);
    }

    #[tokio::test]
    async fn test_duckduckgo_abstract_and_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("format", "json"))
            .and(query_param("q", "mobile money"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "Heading": "Mobile money",
                    "AbstractText": "Mobile money is a technology that allows people to receive, store and spend money using a mobile phone.",
                    "AbstractURL": "https://en.wikipedia.org/wiki/Mobile_money",
                    "RelatedTopics": [
                        {"Text": "M-Pesa - A mobile phone-based money transfer service.", "FirstURL": "https://duckduckgo.com/M-Pesa"},
                        {"Name": "Companies", "Topics": [
                            {"Text": "Orange Money - Mobile payment service.", "FirstURL": "https://duckduckgo.com/Orange_Money"}
                        ]}
                    ]
                }"#,
            ))
            .mount(&server)
            .await;

        let search = client_for(&server);
        let results = search
            .search("mobile money", 3, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Mobile money");
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Mobile_money");
        assert_eq!(results[1].title, "M-Pesa");
        assert_eq!(results[2].title, "Orange Money");
    }

    #[tokio::test]
    async fn test_duckduckgo_respects_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"AbstractText": "", "RelatedTopics": [
                    {"Text": "A - one", "FirstURL": "https://a"},
                    {"Text": "B - two", "FirstURL": "https://b"},
                    {"Text": "C - three", "FirstURL": "https://c"}
                ]}"#,
            ))
            .mount(&server)
            .await;

        let results = client_for(&server)
            .search("anything", 2, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].url, "https://b");
    }

    #[tokio::test]
    async fn test_duckduckgo_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let results = client_for(&server)
            .search("zzzz", 2, CancellationToken::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duckduckgo_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "limited"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let search = client_for(&server);
        let limited = search.search("limited", 2, CancellationToken::new()).await;
        assert!(matches!(limited, Err(ConnectorError::RateLimitExceeded)));

        let broken = search.search("broken", 2, CancellationToken::new()).await;
        assert!(matches!(broken, Err(ConnectorError::ApiError(_))));

        let garbage = search.search("garbage", 2, CancellationToken::new()).await;
        assert!(matches!(garbage, Err(ConnectorError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_duckduckgo_cancelled_before_start() {
        let server = MockServer::start().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client_for(&server).search("frais", 2, cancel).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_duckduckgo_cancelled_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = client_for(&server).search("frais", 2, cancel).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_mock_search_counts_and_limits() {
        let mock = MockExternalSearch::new().with_results(vec![
            ExternalResult::new("a", "https://a", "first"),
            ExternalResult::new("b", "https://b", "second"),
            ExternalResult::new("c", "https://c", "third"),
        ]);

        let results = mock.search("q", 2, CancellationToken::new()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_search_failure() {
        let mock = MockExternalSearch::new().with_failure();
        assert!(mock.search("q", 2, CancellationToken::new()).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_search_observes_cancellation() {
        let mock = MockExternalSearch::new().with_delay(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = mock.search("q", 2, cancel).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
        assert_eq!(mock.cancellation_count(), 1);
    }
}
