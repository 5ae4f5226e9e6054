//! Web search retrieval.
//!
//! A [`SearchProvider`] turns a query into ranked [`SearchDocument`]s. The
//! pipeline only needs title, url and extracted text, so providers decode
//! nothing beyond that.

mod error;
mod exa;
mod fixed;

pub use error::SearchError;
pub use exa::ExaClient;
pub use fixed::StaticSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

/// A single search hit with its extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub title: String,
    pub url: String,
    pub text: String,
}

impl SearchDocument {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns at most `count` documents for `query`, best match first.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchDocument>, SearchError>;
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl SearchProvider for Box<dyn SearchProvider> {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchDocument>, SearchError> {
        (**self).search(query, count).await
    }
}

/// Builds the configured search provider.
///
/// `exa` requires an API key from config or the environment. `static`
/// returns an empty provider, which is only useful for smoke tests.
pub fn from_config(config: &SearchConfig) -> Result<Box<dyn SearchProvider>, SearchError> {
    match config.provider.as_str() {
        "exa" => {
            let key = config.api_key_or_env().ok_or(SearchError::MissingApiKey)?;
            Ok(Box::new(
                ExaClient::new(key)
                    .with_base_url(config.base_url_or_default())
                    .with_max_characters(config.max_characters)
                    .with_timeout(config.timeout_secs),
            ))
        }
        "static" => Ok(Box::new(StaticSearch::default())),
        other => Err(SearchError::UnknownProvider(other.to_string())),
    }
}
