//! Default values for Delve configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default LLM provider.
pub const DEFAULT_LLM_PROVIDER: &str = "cerebras";

/// Default max tokens for the synthesis response.
pub const DEFAULT_MAX_TOKENS: u32 = 600;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default timeout for a single completion request (seconds).
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

// Cerebras defaults (OpenAI-compatible)
/// Default Cerebras API URL.
pub const DEFAULT_CEREBRAS_URL: &str = "https://api.cerebras.ai/v1";
/// Default Cerebras model.
pub const DEFAULT_CEREBRAS_MODEL: &str = "llama-4-scout-17b-16e-instruct";

// OpenAI defaults
/// Default OpenAI API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

// Anthropic defaults
/// Default Anthropic API URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
/// Default Anthropic API version.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Ollama defaults
/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// OpenRouter defaults
/// Default OpenRouter API URL.
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

// ============================================================================
// Search Defaults
// ============================================================================

/// Default search provider.
pub const DEFAULT_SEARCH_PROVIDER: &str = "exa";

/// Default Exa API URL.
pub const DEFAULT_EXA_URL: &str = "https://api.exa.ai";

/// Maximum characters of extracted text requested per document.
pub const DEFAULT_MAX_CHARACTERS: usize = 1000;

/// Default timeout for a single search request (seconds).
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Research Defaults
// ============================================================================

/// Number of documents requested from the search provider.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// A document becomes a source only if its text is longer than this
/// many characters.
pub const DEFAULT_MIN_SOURCE_CHARS: usize = 200;

/// Capacity of the per-request progress event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 16;

// ============================================================================
// Server Defaults
// ============================================================================

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;

/// Origins allowed by CORS by default (local frontend dev servers).
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];
