//! Configuration for the Matha agent.
//!
//! Configuration is an explicit value object handed to the orchestrator at
//! construction, with no global state. It is loaded from environment variables
//! with documented defaults, optionally merged from a YAML config file, and
//! finally overridden by CLI flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AgentError, AgentResult};

/// Default similarity threshold for accepting a retrieval hit.
pub const DEFAULT_KB_THRESHOLD: f32 = 0.78;

/// Default number of candidates requested from the knowledge base.
pub const DEFAULT_KB_TOP_K: usize = 3;

/// Default generation budget per call.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Default sampling temperature. Zero keeps worked answers reproducible.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Positive-feedback count at which retraining becomes due.
pub const DEFAULT_RETRAIN_TRIGGER: usize = 10;

/// Main application configuration.
///
/// Holds every knob the pipeline needs: external endpoints and models,
/// retrieval tuning, generation parameters, and the feedback log location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Qdrant endpoint URL
    pub qdrant_url: String,

    /// Qdrant collection holding the worked-problem knowledge base
    pub collection: String,

    /// Gemini embedding model identifier
    pub embed_model: String,

    /// Gemini generation model identifier
    pub gen_model: String,

    /// API key for the Gemini API
    pub google_api_key: Option<String>,

    /// API key for the Serper.dev web-search fallback
    pub serper_api_key: Option<String>,

    /// Minimum similarity score for the retrieval-hit path (inclusive)
    pub kb_threshold: f32,

    /// Number of candidates requested per retrieval
    pub kb_top_k: usize,

    /// Maximum tokens per generation call
    pub max_tokens: u32,

    /// Sampling temperature per generation call
    pub temperature: f32,

    /// Append-only feedback log (JSON Lines)
    pub feedback_log: PathBuf,

    /// Every N positive feedback entries, a retrain event is emitted
    pub retrain_trigger_count: usize,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    retrieval: Option<RetrievalSection>,
    generation: Option<GenerationSection>,
    feedback: Option<FeedbackSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    url: Option<String>,
    collection: Option<String>,
    threshold: Option<f32>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerationSection {
    model: Option<String>,
    embed_model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeedbackSection {
    log: Option<PathBuf>,
    retrain_trigger_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6333".to_string(),
            collection: "math_kb".to_string(),
            embed_model: "embedding-001".to_string(),
            gen_model: "gemini-2.5-flash".to_string(),
            google_api_key: None,
            serper_api_key: None,
            kb_threshold: DEFAULT_KB_THRESHOLD,
            kb_top_k: DEFAULT_KB_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            feedback_log: PathBuf::from("data/feedback_log.jsonl"),
            retrain_trigger_count: DEFAULT_RETRAIN_TRIGGER,
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `QDRANT_URL`: Qdrant endpoint (default http://localhost:6333)
    /// - `COLLECTION_NAME`: knowledge-base collection (default math_kb)
    /// - `GEMINI_EMBED_MODEL`: embedding model (default embedding-001)
    /// - `GEMINI_GEN_MODEL`: generation model (default gemini-2.5-flash)
    /// - `GOOGLE_API_KEY`: Gemini API key
    /// - `SERPER_API_KEY`: Serper.dev API key (web-search fallback)
    /// - `KB_THRESHOLD`: retrieval-hit threshold (default 0.78)
    /// - `KB_TOPK`: retrieval top-K (default 3)
    /// - `MATHA_CONFIG`: path to a YAML config file
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AgentResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MATHA_CONFIG") {
            config.config_file = Some(PathBuf::from(path));
        }

        // YAML file first, environment variables override it
        if let Some(path) = config.config_file.clone() {
            if path.exists() {
                config = config.merge_yaml(&path)?;
            } else {
                return Err(AgentError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
        }

        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant_url = url;
        }
        if let Ok(collection) = std::env::var("COLLECTION_NAME") {
            config.collection = collection;
        }
        if let Ok(model) = std::env::var("GEMINI_EMBED_MODEL") {
            config.embed_model = model;
        }
        if let Ok(model) = std::env::var("GEMINI_GEN_MODEL") {
            config.gen_model = model;
        }
        if let Ok(threshold) = std::env::var("KB_THRESHOLD") {
            config.kb_threshold = threshold.parse().map_err(|_| {
                AgentError::Config(format!("Invalid KB_THRESHOLD: {}", threshold))
            })?;
        }
        if let Ok(top_k) = std::env::var("KB_TOPK") {
            config.kb_top_k = top_k
                .parse()
                .map_err(|_| AgentError::Config(format!("Invalid KB_TOPK: {}", top_k)))?;
        }

        config.google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        config.serper_api_key = std::env::var("SERPER_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Used for a config file named on the command line; `load` already
    /// merges the `MATHA_CONFIG` one.
    pub fn merge_config_file(&self, path: &PathBuf) -> AgentResult<Self> {
        if !path.exists() {
            return Err(AgentError::Config(format!(
                "Config file does not exist: {:?}",
                path
            )));
        }
        self.merge_yaml(path)
    }

    fn merge_yaml(&self, path: &PathBuf) -> AgentResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AgentError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(retrieval) = file.retrieval {
            if let Some(url) = retrieval.url {
                result.qdrant_url = url;
            }
            if let Some(collection) = retrieval.collection {
                result.collection = collection;
            }
            if let Some(threshold) = retrieval.threshold {
                result.kb_threshold = threshold;
            }
            if let Some(top_k) = retrieval.top_k {
                result.kb_top_k = top_k;
            }
        }

        if let Some(generation) = file.generation {
            if let Some(model) = generation.model {
                result.gen_model = model;
            }
            if let Some(model) = generation.embed_model {
                result.embed_model = model;
            }
            if let Some(max_tokens) = generation.max_tokens {
                result.max_tokens = max_tokens;
            }
            if let Some(temperature) = generation.temperature {
                result.temperature = temperature;
            }
        }

        if let Some(feedback) = file.feedback {
            if let Some(log) = feedback.log {
                result.feedback_log = log;
            }
            if let Some(count) = feedback.retrain_trigger_count {
                result.retrain_trigger_count = count;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides, giving flags precedence over the environment.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        threshold: Option<f32>,
        top_k: Option<usize>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(threshold) = threshold {
            self.kb_threshold = threshold;
        }

        if let Some(top_k) = top_k {
            self.kb_top_k = top_k;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate tuning parameters.
    pub fn validate(&self) -> AgentResult<()> {
        if !self.kb_threshold.is_finite() {
            return Err(AgentError::Config(format!(
                "kb_threshold must be finite, got {}",
                self.kb_threshold
            )));
        }

        if self.kb_top_k == 0 {
            return Err(AgentError::Config(
                "kb_top_k must be at least 1".to_string(),
            ));
        }

        if self.retrain_trigger_count == 0 {
            return Err(AgentError::Config(
                "retrain_trigger_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Require the Gemini API key, erroring with a useful message if unset.
    pub fn require_google_api_key(&self) -> AgentResult<&str> {
        self.google_api_key.as_deref().ok_or_else(|| {
            AgentError::Config(
                "GOOGLE_API_KEY is not set; the Gemini API requires a key".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.qdrant_url, "http://localhost:6333");
        assert_eq!(config.collection, "math_kb");
        assert_eq!(config.kb_threshold, 0.78);
        assert_eq!(config.kb_top_k, 3);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.retrain_trigger_count, 10);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AgentConfig::default().with_overrides(
            None,
            Some(0.9),
            Some(5),
            None,
            true,
            false,
        );

        assert_eq!(config.kb_threshold, 0.9);
        assert_eq!(config.kb_top_k, 5);
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AgentConfig::default();
        config.kb_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_threshold() {
        let mut config = AgentConfig::default();
        config.kb_threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults_ok() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_require_google_api_key_missing() {
        let config = AgentConfig::default();
        assert!(config.require_google_api_key().is_err());
    }
}
