//! Configuration management for Delve.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `delve.toml` file
//! 3. User config `~/.config/delve/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LLMConfig,

    /// Search provider configuration.
    pub search: SearchConfig,

    /// Research pipeline policy.
    pub research: ResearchConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./delve.toml` (project local)
    /// 2. `~/.config/delve/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("delve.toml").exists() {
            return Self::from_file("delve.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("delve").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // LLM overrides
        if let Ok(provider) = std::env::var("DELVE_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("DELVE_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(url) = std::env::var("DELVE_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("DELVE_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(tokens) = std::env::var("DELVE_LLM_MAX_TOKENS") {
            if let Ok(n) = tokens.parse() {
                self.llm.max_tokens = n;
            }
        }

        // Search overrides
        if let Ok(key) = std::env::var("DELVE_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("DELVE_SEARCH_BASE_URL") {
            self.search.base_url = Some(url);
        }

        // Research overrides
        if let Ok(n) = std::env::var("DELVE_NUM_RESULTS") {
            if let Ok(n) = n.parse() {
                self.research.num_results = n;
            }
        }

        // Server overrides
        if let Ok(host) = std::env::var("DELVE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DELVE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.research.num_results == 0 {
            return Err(ConfigError::Invalid(
                "research.num_results must be at least 1".to_string(),
            ));
        }
        if self.research.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "research.event_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Provider name: "cerebras", "openai", "anthropic", "ollama",
    /// "openrouter" or "scripted".
    pub provider: String,

    /// Model name (provider-specific).
    pub model: Option<String>,

    /// Base URL for API (for openai-compatible providers).
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// API version (for Anthropic).
    pub api_version: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: None,    // Use provider default
            base_url: None, // Use provider default
            api_key: None,  // Load from env
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            api_version: Some(DEFAULT_ANTHROPIC_API_VERSION.to_string()),
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to provider defaults.
    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| match self.provider.as_str() {
                "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL.to_string(),
                "ollama" => DEFAULT_OLLAMA_MODEL.to_string(),
                "cerebras" => DEFAULT_CEREBRAS_MODEL.to_string(),
                _ => DEFAULT_OPENAI_MODEL.to_string(),
            })
    }

    /// Get the base URL, falling back to provider defaults.
    pub fn base_url_or_default(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| match self.provider.as_str() {
                "anthropic" | "claude" => DEFAULT_ANTHROPIC_URL.to_string(),
                "ollama" => DEFAULT_OLLAMA_URL.to_string(),
                "openrouter" => DEFAULT_OPENROUTER_URL.to_string(),
                "cerebras" => DEFAULT_CEREBRAS_URL.to_string(),
                _ => DEFAULT_OPENAI_URL.to_string(),
            })
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("DELVE_LLM_API_KEY").ok())
            .or_else(|| match self.provider.as_str() {
                "anthropic" | "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
                "cerebras" => std::env::var("CEREBRAS_API_KEY").ok(),
                "openrouter" => std::env::var("OPENROUTER_API_KEY").ok(),
                _ => std::env::var("OPENAI_API_KEY").ok(),
            })
    }
}

/// Search provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider name. Only "exa" talks to the network.
    pub provider: String,

    /// Base URL of the search API.
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum characters of text requested per document.
    pub max_characters: usize,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_SEARCH_PROVIDER.to_string(),
            base_url: None,
            api_key: None,
            max_characters: DEFAULT_MAX_CHARACTERS,
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    /// Get the base URL, falling back to the Exa endpoint.
    pub fn base_url_or_default(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_EXA_URL.to_string())
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("DELVE_SEARCH_API_KEY").ok())
            .or_else(|| std::env::var("EXA_API_KEY").ok())
    }
}

/// Research pipeline policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Number of documents requested from the search provider.
    pub num_results: usize,

    /// Minimum text length (exclusive, in characters) for a document to
    /// count as a source.
    pub min_source_chars: usize,

    /// Capacity of the progress event channel.
    pub event_buffer: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            num_results: DEFAULT_NUM_RESULTS,
            min_source_chars: DEFAULT_MIN_SOURCE_CHARS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
        assert_eq!(config.research.num_results, DEFAULT_NUM_RESULTS);
        assert_eq!(config.research.min_source_chars, DEFAULT_MIN_SOURCE_CHARS);
        assert_eq!(config.search.max_characters, DEFAULT_MAX_CHARACTERS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("[research]"));
        assert!(toml_str.contains("[server]"));
    }

    #[test]
    fn test_api_keys_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        config.search.api_key = Some("exa-secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("sk-secret"));
        assert!(!toml_str.contains("exa-secret"));
    }

    #[test]
    fn test_validate_rejects_zero_results() {
        let mut config = Config::default();
        config.research.num_results = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_model_or_default() {
        let mut config = LLMConfig::default();
        assert_eq!(config.model_or_default(), DEFAULT_CEREBRAS_MODEL);

        config.provider = "anthropic".to_string();
        assert_eq!(config.model_or_default(), DEFAULT_ANTHROPIC_MODEL);

        config.provider = "ollama".to_string();
        assert_eq!(config.model_or_default(), DEFAULT_OLLAMA_MODEL);

        config.provider = "openai".to_string();
        assert_eq!(config.model_or_default(), DEFAULT_OPENAI_MODEL);

        config.model = Some("custom-model".to_string());
        assert_eq!(config.model_or_default(), "custom-model");
    }

    #[test]
    fn test_base_url_or_default() {
        let mut config = LLMConfig::default();
        assert_eq!(config.base_url_or_default(), DEFAULT_CEREBRAS_URL);

        config.provider = "openrouter".to_string();
        assert_eq!(config.base_url_or_default(), DEFAULT_OPENROUTER_URL);

        let search = SearchConfig::default();
        assert_eq!(search.base_url_or_default(), DEFAULT_EXA_URL);
    }
}
