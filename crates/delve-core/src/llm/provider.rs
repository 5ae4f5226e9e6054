use super::{ClaudeClient, LLMError, OpenAIClient, ScriptedLLM, LLM};
use crate::config::{
    LLMConfig, DEFAULT_CEREBRAS_MODEL, DEFAULT_CEREBRAS_URL, DEFAULT_LLM_TIMEOUT_SECS,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

/// Canned response used by the `scripted` provider.
const SCRIPTED_RESPONSE: &[&str] = &[
    "SUMMARY: ",
    "This is an offline response produced without contacting a model.",
    "\n\nINSIGHTS:\n",
    "- Sources were retrieved and filtered\n",
    "- The synthesis prompt was assembled\n",
    "- No completion provider was called",
];

/// LLM Provider configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI-compatible endpoint
    OpenAI {
        base_url: String,
        api_key: Option<String>,
        model: String,
    },
    /// Cerebras inference (OpenAI-compatible, key required)
    Cerebras {
        api_key: Option<String>,
        model: String,
    },
    /// Anthropic Claude
    Anthropic {
        api_key: Option<String>,
        model: String,
        api_version: Option<String>,
    },
    /// Local Ollama instance
    Ollama { base_url: String, model: String },
    /// Fixed fragments, no network
    Scripted { fragments: Vec<String> },
}

/// Generation settings shared by every network provider.
#[derive(Debug, Clone, Copy)]
struct Tuning {
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Cerebras {
            api_key: None,
            model: DEFAULT_CEREBRAS_MODEL.to_string(),
        }
    }
}

impl Provider {
    /// Creates a provider from LLMConfig.
    ///
    /// Returns an error for provider names it does not know.
    pub fn from_config(config: &LLMConfig) -> Result<Self, LLMError> {
        let provider = match config.provider.as_str() {
            "cerebras" => Provider::Cerebras {
                api_key: config.api_key_or_env(),
                model: config.model_or_default(),
            },
            "anthropic" | "claude" => Provider::Anthropic {
                api_key: config.api_key_or_env(),
                model: config.model_or_default(),
                api_version: config.api_version.clone(),
            },
            "ollama" => Provider::Ollama {
                base_url: config.base_url_or_default(),
                model: config.model_or_default(),
            },
            "openai" | "openrouter" | "openai-compatible" => Provider::OpenAI {
                base_url: config.base_url_or_default(),
                api_key: config.api_key_or_env(),
                model: config.model_or_default(),
            },
            "scripted" => Provider::Scripted {
                fragments: SCRIPTED_RESPONSE.iter().map(|s| s.to_string()).collect(),
            },
            other => return Err(LLMError::UnknownProvider(other.to_string())),
        };
        Ok(provider)
    }

    /// Builds a client using the generation settings from `config`.
    pub fn build_with(self, config: &LLMConfig) -> Result<Box<dyn LLM>, LLMError> {
        self.build_tuned(Tuning {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Creates an LLM client with default generation settings.
    pub fn build(self) -> Result<Box<dyn LLM>, LLMError> {
        self.build_tuned(Tuning::default())
    }

    fn build_tuned(self, tuning: Tuning) -> Result<Box<dyn LLM>, LLMError> {
        match self {
            Provider::OpenAI {
                base_url,
                api_key,
                model,
            } => Ok(Box::new(
                OpenAIClient::new(base_url, api_key.unwrap_or_default(), model)
                    .with_max_tokens(tuning.max_tokens)
                    .with_temperature(tuning.temperature)
                    .with_timeout(tuning.timeout_secs),
            )),

            Provider::Cerebras { api_key, model } => {
                let key = api_key.ok_or(LLMError::MissingApiKey)?;
                Ok(Box::new(
                    OpenAIClient::new(DEFAULT_CEREBRAS_URL, key, model)
                        .with_max_tokens(tuning.max_tokens)
                        .with_temperature(tuning.temperature)
                        .with_timeout(tuning.timeout_secs),
                ))
            }

            Provider::Anthropic {
                api_key,
                model,
                api_version,
            } => {
                let key = api_key.ok_or(LLMError::MissingApiKey)?;
                let mut client = ClaudeClient::new(key)
                    .with_model(model)
                    .with_max_tokens(tuning.max_tokens)
                    .with_temperature(tuning.temperature)
                    .with_timeout(tuning.timeout_secs);
                if let Some(version) = api_version {
                    client = client.with_api_version(version);
                }
                Ok(Box::new(client))
            }

            Provider::Ollama { base_url, model } => Ok(Box::new(
                OpenAIClient::new(base_url, "", model)
                    .with_max_tokens(tuning.max_tokens)
                    .with_temperature(tuning.temperature)
                    .with_timeout(tuning.timeout_secs),
            )),

            Provider::Scripted { fragments } => Ok(Box::new(ScriptedLLM::new(fragments))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OLLAMA_MODEL;

    #[test]
    fn test_default_provider() {
        let provider = Provider::default();
        assert!(matches!(provider, Provider::Cerebras { .. }));
    }

    #[test]
    fn test_cerebras_requires_key() {
        let provider = Provider::Cerebras {
            api_key: None,
            model: DEFAULT_CEREBRAS_MODEL.to_string(),
        };
        assert!(matches!(provider.build(), Err(LLMError::MissingApiKey)));
    }

    #[test]
    fn test_ollama_provider_build() {
        let provider = Provider::Ollama {
            base_url: "http://localhost:11434/v1".to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        };
        // Should succeed without API key
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = LLMConfig {
            provider: "ollama".to_string(),
            model: Some("codellama".to_string()),
            ..Default::default()
        };

        let provider = Provider::from_config(&config).unwrap();
        assert!(matches!(provider, Provider::Ollama { model, .. } if model == "codellama"));
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = LLMConfig {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Provider::from_config(&config),
            Err(LLMError::UnknownProvider(name)) if name == "mystery"
        ));
    }

    #[tokio::test]
    async fn test_scripted_provider_follows_template() {
        let config = LLMConfig {
            provider: "scripted".to_string(),
            ..Default::default()
        };
        let llm = Provider::from_config(&config).unwrap().build_with(&config).unwrap();
        let response = llm.complete("anything").await.unwrap();
        assert!(response.starts_with("SUMMARY: "));
        assert!(response.contains("\n\nINSIGHTS:\n- "));
    }
}
