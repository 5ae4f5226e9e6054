use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::sse::{parse_event, SseBuffer};
use super::{LLMError, StreamChunk, LLM};
use crate::config::{
    DEFAULT_ANTHROPIC_API_VERSION, DEFAULT_ANTHROPIC_MODEL, DEFAULT_ANTHROPIC_URL,
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

/// Claude API client.
pub struct ClaudeClient {
    api_key: String,
    api_url: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: Client,
}

impl ClaudeClient {
    /// Creates a new Claude client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_ANTHROPIC_URL.to_string(),
            api_version: DEFAULT_ANTHROPIC_API_VERSION.to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            client: timeout_client(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum tokens for responses.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the API URL (for proxies or enterprise deployments).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = timeout_client(timeout_secs);
        self
    }

    fn request(&self, prompt: &str, stream: bool) -> ClaudeRequest {
        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: stream.then_some(true),
        }
    }

    async fn post(&self, request: &ClaudeRequest) -> Result<reqwest::Response, LLMError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            return Err(LLMError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LLM for ClaudeClient {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let response = self.post(&self.request(prompt, false)).await?;

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let text = claude_response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }

    async fn stream_complete(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamChunk>,
    ) -> Result<String, LLMError> {
        let response = self.post(&self.request(prompt, true)).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = SseBuffer::new();
        let mut full = String::new();
        let mut stopped = false;

        'read: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| LLMError::Network(e.to_string()))?;
            buffer.push(&chunk);

            while let Some(block) = buffer.next_event() {
                match parse_claude_sse_event(&block)? {
                    ClaudeStreamEvent::Text(text) => {
                        full.push_str(&text);
                        tx.send(StreamChunk::text(text))
                            .await
                            .map_err(|_| LLMError::Cancelled)?;
                    }
                    ClaudeStreamEvent::Stop => {
                        stopped = true;
                        break 'read;
                    }
                    ClaudeStreamEvent::Other => {}
                }
            }
        }

        if !stopped {
            return Err(LLMError::Incomplete);
        }

        tx.send(StreamChunk::done(full.clone()))
            .await
            .map_err(|_| LLMError::Cancelled)?;
        Ok(full)
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

fn timeout_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ClaudeStreamEvent {
    Text(String),
    Stop,
    Other,
}

/// Parse a Claude SSE event.
///
/// Claude streaming format:
/// ```text
/// event: content_block_delta
/// data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}
/// ```
///
/// `message_stop` ends the stream; an `error` event becomes an API error.
fn parse_claude_sse_event(event_data: &str) -> Result<ClaudeStreamEvent, LLMError> {
    let event = parse_event(event_data);

    match event.event {
        Some("content_block_delta") => {}
        Some("message_stop") => return Ok(ClaudeStreamEvent::Stop),
        Some("error") => {
            return Err(LLMError::ApiError {
                status: 200,
                message: event.data.unwrap_or_default(),
            })
        }
        _ => return Ok(ClaudeStreamEvent::Other),
    }

    let Some(data) = event.data else {
        return Ok(ClaudeStreamEvent::Other);
    };

    #[derive(Deserialize)]
    struct DeltaEvent {
        delta: Delta,
    }

    #[derive(Deserialize)]
    struct Delta {
        #[serde(default)]
        text: String,
    }

    let parsed: DeltaEvent =
        serde_json::from_str(&data).map_err(|e| LLMError::ParseError(e.to_string()))?;

    if parsed.delta.text.is_empty() {
        Ok(ClaudeStreamEvent::Other)
    } else {
        Ok(ClaudeStreamEvent::Text(parsed.delta.text))
    }
}
