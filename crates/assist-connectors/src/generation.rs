//! Text generation connector.
//!
//! [`Generator`] is called at most once per request by the orchestrator.
//! [`ApiGenerator`] talks to OpenAI-compatible, Anthropic or Gemini
//! endpoints and owns its retry policy; [`MockGenerator`] is for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use assist_types::{GenerationProvider, GenerationSettings};

use crate::error::{ensure_success, ConnectorError};

/// Pluggable text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce text for `prompt`. Blank output is reported as an error.
    async fn generate(&self, prompt: &str) -> Result<String, ConnectorError>;
}

/// Configuration for API-based generation.
#[derive(Debug, Clone)]
pub struct ApiGeneratorConfig {
    pub provider: GenerationProvider,

    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "gpt-4o-mini", "gemini-2.5-flash")
    pub model: String,

    pub api_key: SecretString,

    /// Request timeout
    pub timeout: Duration,

    /// Total attempts before giving up
    pub max_retries: u32,

    /// First retry delay; grows exponentially
    pub initial_backoff: Duration,

    pub max_tokens: u32,

    pub temperature: f32,
}

impl ApiGeneratorConfig {
    fn with_provider(
        provider: GenerationProvider,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            base_url: default_base_url(provider).to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    /// Create config for OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(GenerationProvider::Openai, api_key, model)
    }

    /// Create config for Claude API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(GenerationProvider::Anthropic, api_key, model)
    }

    /// Create config for Gemini API.
    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(GenerationProvider::Gemini, api_key, model)
    }

    /// Build from application settings. Requires an API key.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, ConnectorError> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ConnectorError::ConfigError("generation.api_key is not set".to_string())
            })?;

        let mut config = Self::with_provider(settings.provider, api_key, settings.model.clone());
        if let Some(url) = &settings.api_base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config.timeout = Duration::from_secs(settings.timeout_secs);
        config.max_retries = settings.max_retries;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }
}

fn default_base_url(provider: GenerationProvider) -> &'static str {
    match provider {
        GenerationProvider::Openai => "https://api.openai.com/v1",
        GenerationProvider::Anthropic => "https://api.anthropic.com/v1",
        GenerationProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
    }
}

/// API-based generator implementation.
pub struct ApiGenerator {
    client: Client,
    config: ApiGeneratorConfig,
}

impl ApiGenerator {
    /// Create a new API generator.
    pub fn new(config: ApiGeneratorConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Call the API with retry logic.
    async fn call_api(&self, prompt: &str) -> Result<String, ConnectorError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_elapsed_time: Some(self.config.timeout * 2),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, provider = ?self.config.provider, "Calling generation API");

            match self.make_request(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() || attempts >= self.config.max_retries {
                        error!(error = %e, attempts, "Generation failed");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "API call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Make a single API request.
    async fn make_request(&self, prompt: &str) -> Result<String, ConnectorError> {
        let text = match self.config.provider {
            GenerationProvider::Openai => self.make_openai_request(prompt).await?,
            GenerationProvider::Anthropic => self.make_anthropic_request(prompt).await?,
            GenerationProvider::Gemini => self.make_gemini_request(prompt).await?,
        };

        if text.trim().is_empty() {
            return Err(ConnectorError::EmptyResponse);
        }
        Ok(text.trim().to_string())
    }

    /// Make OpenAI-compatible API request.
    async fn make_openai_request(&self, prompt: &str) -> Result<String, ConnectorError> {
        #[derive(Serialize)]
        struct OpenAIRequest {
            model: String,
            messages: Vec<OpenAIMessage>,
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Serialize)]
        struct OpenAIMessage {
            role: String,
            content: String,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessageResponse,
        }

        #[derive(Deserialize)]
        struct OpenAIMessageResponse {
            #[serde(default)]
            content: Option<String>,
        }

        let request = OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response_body: OpenAIResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ConnectorError::ParseError(e.to_string()))?;

        response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ConnectorError::ParseError("No choices in response".to_string()))
    }

    /// Make Anthropic API request.
    async fn make_anthropic_request(&self, prompt: &str) -> Result<String, ConnectorError> {
        #[derive(Serialize)]
        struct AnthropicRequest {
            model: String,
            max_tokens: u32,
            temperature: f32,
            messages: Vec<AnthropicMessage>,
        }

        #[derive(Serialize)]
        struct AnthropicMessage {
            role: String,
            content: String,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let url = format!("{}/messages", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response_body: AnthropicResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ConnectorError::ParseError(e.to_string()))?;

        if response_body.content.is_empty() {
            return Err(ConnectorError::ParseError("No content in response".to_string()));
        }

        Ok(response_body
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    /// Make Gemini `generateContent` request.
    async fn make_gemini_request(&self, prompt: &str) -> Result<String, ConnectorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GeminiRequest {
            contents: Vec<GeminiContent>,
            generation_config: GeminiGenerationConfig,
        }

        #[derive(Serialize, Deserialize)]
        struct GeminiContent {
            #[serde(default)]
            parts: Vec<GeminiPart>,
        }

        #[derive(Serialize, Deserialize)]
        struct GeminiPart {
            #[serde(default)]
            text: String,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GeminiGenerationConfig {
            max_output_tokens: u32,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct GeminiResponse {
            #[serde(default)]
            candidates: Vec<GeminiCandidate>,
        }

        #[derive(Deserialize)]
        struct GeminiCandidate {
            content: Option<GeminiContent>,
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response_body: GeminiResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ConnectorError::ParseError(e.to_string()))?;

        response_body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| ConnectorError::ParseError("No candidates in response".to_string()))
    }
}

#[async_trait]
impl Generator for ApiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ConnectorError> {
        if prompt.trim().is_empty() {
            return Err(ConnectorError::ConfigError("empty prompt".to_string()));
        }
        self.call_api(prompt).await
    }
}

enum MockBehavior {
    Respond(String),
    Fail,
    Panic,
}

/// Scripted generator for tests.
///
/// Records the number of calls and the last prompt it received.
pub struct MockGenerator {
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    /// Generator that answers every prompt with `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self::from_behavior(MockBehavior::Respond(text.into()))
    }

    /// Generator whose every call fails.
    pub fn failing() -> Self {
        Self::from_behavior(MockBehavior::Fail)
    }

    /// Generator whose every call panics.
    pub fn panicking() -> Self {
        Self::from_behavior(MockBehavior::Panic)
    }

    fn from_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Respond(text) if text.trim().is_empty() => {
                Err(ConnectorError::EmptyResponse)
            }
            MockBehavior::Respond(text) => Ok(text.clone()),
            MockBehavior::Fail => Err(ConnectorError::ApiError("mock generation failure".to_string())),
            MockBehavior::Panic => panic!("mock generator panicked"),
        }
    }
}
