pub mod config;
pub mod llm;
pub mod research;
pub mod search;

pub use config::{Config, ConfigError, LLMConfig, ResearchConfig, SearchConfig, ServerConfig};
pub use llm::{ClaudeClient, LLMError, OpenAIClient, ScriptedLLM, LLM};
pub use research::{
    ProgressEvent, ResearchError, ResearchPipeline, ResearchReport, ResearchSummary,
};
pub use search::{ExaClient, SearchDocument, SearchError, SearchProvider, StaticSearch};
