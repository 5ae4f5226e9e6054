use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SearchDocument, SearchError, SearchProvider};
use crate::config::{DEFAULT_EXA_URL, DEFAULT_MAX_CHARACTERS, DEFAULT_SEARCH_TIMEOUT_SECS};

/// Exa search API client.
///
/// Uses `/search` with inline content extraction so a single request
/// returns both ranking and page text.
pub struct ExaClient {
    api_key: String,
    base_url: String,
    max_characters: usize,
    client: Client,
}

impl ExaClient {
    /// Creates a new Exa client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_EXA_URL.to_string(),
            max_characters: DEFAULT_MAX_CHARACTERS,
            client: http_client(DEFAULT_SEARCH_TIMEOUT_SECS),
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Caps the extracted text returned per document.
    pub fn with_max_characters(mut self, max_characters: usize) -> Self {
        self.max_characters = max_characters;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = http_client(timeout_secs);
        self
    }

    fn request(&self, query: &str, count: usize) -> ExaRequest {
        ExaRequest {
            query: query.to_string(),
            search_type: "auto".to_string(),
            num_results: count,
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: self.max_characters,
                },
            },
        }
    }
}

#[async_trait]
impl SearchProvider for ExaClient {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchDocument>, SearchError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&self.request(query, count))
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            return Err(SearchError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await?;
        let documents = parse_exa_response(&body, count)?;
        debug!(query, returned = documents.len(), "exa search finished");
        Ok(documents)
    }
}

fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// Decodes an Exa `/search` body, keeping provider order and at most
/// `count` results.
fn parse_exa_response(body: &str, count: usize) -> Result<Vec<SearchDocument>, SearchError> {
    let parsed: ExaResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    Ok(parsed
        .results
        .into_iter()
        .take(count)
        .map(|r| SearchDocument {
            title: r.title.unwrap_or_default(),
            url: r.url.unwrap_or_default(),
            text: r.text.unwrap_or_default(),
        })
        .collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaRequest {
    query: String,
    #[serde(rename = "type")]
    search_type: String,
    num_results: usize,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    max_characters: usize,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
}
