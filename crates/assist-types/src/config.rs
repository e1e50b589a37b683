//! Configuration loading for support-assist.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/support-assist/config.toml.
//!
//! Every confidence threshold used by the orchestrator is a setting here;
//! none of them are behavioural constants.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AssistError;

/// Knowledge-index query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of candidate vectors kept before deduplication
    pub top_k: usize,

    /// Minimum cosine similarity for a match to be returned
    pub min_score: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.3,
        }
    }
}

/// Confidence gates and the confidence reported per answer source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    /// Below this knowledge-base score the external search tier is consulted
    pub external_search_below: f32,

    /// Below this knowledge-base score the generation connector is called
    pub generation_below: f32,

    /// Minimum score for a knowledge-base match to be served directly
    pub kb_answer_min: f32,

    /// Confidence reported for a generated answer
    pub generation_confidence: f32,

    /// Confidence reported for an answer built from external search results
    pub external_confidence: f32,

    /// Confidence reported for a template answer (at most 0.6)
    pub template_confidence: f32,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            external_search_below: 0.5,
            generation_below: 0.6,
            kb_answer_min: 0.5,
            generation_confidence: 0.8,
            external_confidence: 0.6,
            template_confidence: 0.6,
        }
    }
}

/// Upper bound for template confidence; the presentation layer relies on it.
pub const MAX_TEMPLATE_CONFIDENCE: f32 = 0.6;

impl ThresholdSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("external_search_below", self.external_search_below),
            ("generation_below", self.generation_below),
            ("kb_answer_min", self.kb_answer_min),
            ("generation_confidence", self.generation_confidence),
            ("external_confidence", self.external_confidence),
            ("template_confidence", self.template_confidence),
        ];
        for (name, value) in values {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be 0.0-1.0, got {}", name, value));
            }
        }
        if self.template_confidence > MAX_TEMPLATE_CONFIDENCE {
            return Err(format!(
                "template_confidence must be <= {}, got {}",
                MAX_TEMPLATE_CONFIDENCE, self.template_confidence
            ));
        }
        Ok(())
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live of a cached lookup, in seconds
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

/// External search connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSearchSettings {
    pub enabled: bool,

    /// Base URL of the instant-answer API
    pub base_url: String,

    /// Hard deadline applied by the orchestrator (ms)
    pub deadline_ms: u64,

    /// Maximum snippets kept from one lookup
    pub max_results: usize,

    /// HTTP client timeout (s); the orchestrator deadline usually fires first
    pub timeout_secs: u64,
}

impl Default for ExternalSearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.duckduckgo.com".to_string(),
            deadline_ms: 3000,
            max_results: 2,
            timeout_secs: 10,
        }
    }
}

/// Generation service flavour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    /// OpenAI-compatible chat completions (also vLLM, Ollama, ...)
    #[default]
    Openai,
    Anthropic,
    Gemini,
}

/// Generation connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub enabled: bool,

    pub provider: GenerationProvider,

    /// Model name (e.g., "gpt-4o-mini", "gemini-2.5-flash")
    pub model: String,

    /// API key (usually supplied through ASSIST_GENERATION__API_KEY)
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base_url: Option<String>,

    pub timeout_secs: u64,

    /// Attempts made by the connector itself before giving up
    pub max_retries: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: GenerationProvider::default(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_base_url: None,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Upper bound on the rolling topic window.
pub const MAX_RECENT_TOPICS: usize = 3;

/// Allowed number of exchanges kept per user.
pub const HISTORY_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 10..=20;

/// Conversation memory bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Size of the rolling topic window
    pub max_topics: usize,

    /// Number of exchanges kept per user
    pub history_limit: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_topics: MAX_RECENT_TOPICS,
            history_limit: *HISTORY_LIMIT_RANGE.end(),
        }
    }
}

/// Human support channel quoted in templates, escalations and prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportContact {
    /// Service name used in greetings and prompts
    pub brand: String,
    pub phone: String,
    pub email: String,
    pub hours: String,
    pub currency: String,
}

impl Default for SupportContact {
    fn default() -> Self {
        Self {
            brand: "ZamaPay".to_string(),
            phone: "70 123 456".to_string(),
            email: "support@example.com".to_string(),
            hours: "lundi-vendredi 8h-20h, samedi 9h-18h".to_string(),
            currency: "F CFA".to_string(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the knowledge-base JSON file
    #[serde(default = "default_knowledge_base_path")]
    pub knowledge_base_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on the whole respond pipeline (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub thresholds: ThresholdSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub external_search: ExternalSearchSettings,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub memory: MemorySettings,

    #[serde(default)]
    pub support: SupportContact,
}

fn default_knowledge_base_path() -> String {
    ProjectDirs::from("", "", "support-assist")
        .map(|p| p.data_local_dir().join("knowledge_base.json"))
        .unwrap_or_else(|| PathBuf::from("./knowledge_base.json"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            knowledge_base_path: default_knowledge_base_path(),
            log_level: default_log_level(),
            request_timeout_ms: default_request_timeout_ms(),
            search: SearchSettings::default(),
            thresholds: ThresholdSettings::default(),
            cache: CacheSettings::default(),
            external_search: ExternalSearchSettings::default(),
            generation: GenerationSettings::default(),
            memory: MemorySettings::default(),
            support: SupportContact::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/support-assist/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (ASSIST_*, nested keys joined with "__")
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, AssistError> {
        let config_dir = ProjectDirs::from("", "", "support-assist")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("knowledge_base_path", default_knowledge_base_path())
            .map_err(|e| AssistError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| AssistError::Config(e.to_string()))?
            .set_default("request_timeout_ms", default_request_timeout_ms() as i64)
            .map_err(|e| AssistError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: ASSIST_LOG_LEVEL, ASSIST_THRESHOLDS__GENERATION_BELOW, ...
        builder = builder.add_source(
            Environment::with_prefix("ASSIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AssistError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| AssistError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), AssistError> {
        self.thresholds.validate().map_err(AssistError::Config)?;

        if self.search.top_k == 0 {
            return Err(AssistError::Config("search.top_k must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.search.min_score) {
            return Err(AssistError::Config(format!(
                "search.min_score must be 0.0-1.0, got {}",
                self.search.min_score
            )));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AssistError::Config("cache.ttl_secs must be > 0".to_string()));
        }
        if self.external_search.deadline_ms == 0 {
            return Err(AssistError::Config(
                "external_search.deadline_ms must be > 0".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(AssistError::Config(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.request_timeout_ms <= self.external_search.deadline_ms {
            return Err(AssistError::Config(format!(
                "request_timeout_ms ({}) must exceed external_search.deadline_ms ({})",
                self.request_timeout_ms, self.external_search.deadline_ms
            )));
        }
        if !(1..=MAX_RECENT_TOPICS).contains(&self.memory.max_topics) {
            return Err(AssistError::Config(format!(
                "memory.max_topics must be 1-{}, got {}",
                MAX_RECENT_TOPICS, self.memory.max_topics
            )));
        }
        if !HISTORY_LIMIT_RANGE.contains(&self.memory.history_limit) {
            return Err(AssistError::Config(format!(
                "memory.history_limit must be {}-{}, got {}",
                HISTORY_LIMIT_RANGE.start(),
                HISTORY_LIMIT_RANGE.end(),
                self.memory.history_limit
            )));
        }
        Ok(())
    }

    /// Expand ~ in knowledge_base_path to the home directory
    pub fn expanded_knowledge_base_path(&self) -> PathBuf {
        if let Some(rest) = self.knowledge_base_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.knowledge_base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.top_k, 3);
        assert!((settings.search.min_score - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert_eq!(settings.external_search.deadline_ms, 3000);
        assert_eq!(settings.memory.max_topics, 3);
        assert_eq!(settings.generation.provider, GenerationProvider::Openai);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.request_timeout_ms, 15_000);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[thresholds]
generation_below = 0.55

[generation]
provider = "gemini"
model = "gemini-2.5-flash"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert!((settings.thresholds.generation_below - 0.55).abs() < f32::EPSILON);
        // untouched keys keep their defaults
        assert!((settings.thresholds.kb_answer_min - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.generation.provider, GenerationProvider::Gemini);
        assert_eq!(settings.generation.timeout_secs, 30);
    }

    #[test]
    fn test_template_confidence_ceiling() {
        let mut thresholds = ThresholdSettings::default();
        assert!(thresholds.validate().is_ok());

        thresholds.template_confidence = 0.7;
        assert!(thresholds.validate().is_err());

        thresholds.template_confidence = 0.5;
        thresholds.generation_below = 1.5;
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_bounds() {
        let mut settings = Settings::default();
        settings.cache.ttl_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.external_search.deadline_ms = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.search.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_request_timeout_must_exceed_search_deadline() {
        let mut settings = Settings::default();
        settings.request_timeout_ms = 100;
        settings.external_search.deadline_ms = 3000;
        assert!(settings.validate().is_err());

        settings.request_timeout_ms = 3000;
        assert!(settings.validate().is_err());

        settings.request_timeout_ms = 3001;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_topic_window_bounds() {
        let mut settings = Settings::default();
        settings.memory.max_topics = MAX_RECENT_TOPICS + 1;
        assert!(settings.validate().is_err());

        settings.memory.max_topics = 0;
        assert!(settings.validate().is_err());

        settings.memory.max_topics = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_history_limit_bounds() {
        let mut settings = Settings::default();
        for limit in [0, 9, 21, 1000] {
            settings.memory.history_limit = limit;
            assert!(settings.validate().is_err(), "history_limit {limit}");
        }
        for limit in [10, 15, 20] {
            settings.memory.history_limit = limit;
            assert!(settings.validate().is_ok(), "history_limit {limit}");
        }
    }

    #[test]
    fn test_expanded_path_passthrough() {
        let mut settings = Settings::default();
        settings.knowledge_base_path = "/srv/kb.json".to_string();
        assert_eq!(
            settings.expanded_knowledge_base_path(),
            PathBuf::from("/srv/kb.json")
        );
    }
}
