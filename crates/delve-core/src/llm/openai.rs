use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use super::sse::{parse_event, SseBuffer};
use super::{LLMError, StreamChunk, LLM};
use crate::config::{
    DEFAULT_CEREBRAS_URL, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_URL,
    DEFAULT_OPENAI_URL, DEFAULT_OPENROUTER_URL, DEFAULT_TEMPERATURE,
};

/// OpenAI-compatible API client.
///
/// Works with any provider that implements the OpenAI chat completions API:
/// - OpenAI
/// - Cerebras
/// - Ollama (http://localhost:11434/v1)
/// - vLLM
/// - OpenRouter
/// - Groq
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: Client,
}

impl OpenAIClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://api.openai.com/v1")
    /// * `api_key` - The API key (can be empty for local providers like Ollama)
    /// * `model` - The model name (e.g., "gpt-4o", "llama3")
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            client: build_http_client(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Creates a client for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENAI_URL, api_key, model)
    }

    /// Creates a client for Cerebras inference.
    pub fn cerebras(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_CEREBRAS_URL, api_key, model)
    }

    /// Creates a client for Ollama (local).
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OLLAMA_URL, "", model)
    }

    /// Creates a client for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENROUTER_URL, api_key, model)
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

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = build_http_client(timeout_secs);
        self
    }

    fn request(&self, prompt: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            stream: stream.then_some(true),
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json");

        // Only add authorization if api_key is not empty
        if !self.api_key.is_empty() {
            req = req.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.json(request).send().await?;

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
impl LLM for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let response = self.post(&self.request(prompt, false)).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        // Extract content from first choice
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
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
        let mut finished = false;

        'read: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| LLMError::Network(e.to_string()))?;
            buffer.push(&chunk);

            while let Some(block) = buffer.next_event() {
                match parse_openai_sse_event(&block)? {
                    OpenAIStreamEvent::Delta(text) => {
                        full.push_str(&text);
                        tx.send(StreamChunk::text(text))
                            .await
                            .map_err(|_| LLMError::Cancelled)?;
                    }
                    OpenAIStreamEvent::Done => {
                        finished = true;
                        break 'read;
                    }
                    OpenAIStreamEvent::Finished => finished = true,
                    OpenAIStreamEvent::Skip => {}
                }
            }
        }

        if !finished {
            return Err(LLMError::Incomplete);
        }

        debug!(chars = full.len(), model = %self.model, "completion stream finished");
        tx.send(StreamChunk::done(full.clone()))
            .await
            .map_err(|_| LLMError::Cancelled)?;
        Ok(full)
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

fn build_http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum OpenAIStreamEvent {
    /// A non-empty content fragment.
    Delta(String),
    /// A choice reported a finish reason.
    Finished,
    /// The `[DONE]` sentinel.
    Done,
    /// Anything without content (role announcements, keep-alives).
    Skip,
}

/// Parse one OpenAI-style SSE block.
///
/// OpenAI streaming format:
/// ```text
/// data: {"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}
///
/// data: [DONE]
/// ```
///
/// An `error` object in the payload is surfaced as an API error.
fn parse_openai_sse_event(block: &str) -> Result<OpenAIStreamEvent, LLMError> {
    let Some(data) = parse_event(block).data else {
        return Ok(OpenAIStreamEvent::Skip);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(OpenAIStreamEvent::Done);
    }

    #[derive(Deserialize)]
    struct StreamResponse {
        #[serde(default)]
        choices: Vec<StreamChoice>,
        #[serde(default)]
        error: Option<StreamErrorBody>,
    }

    #[derive(Deserialize)]
    struct StreamChoice {
        #[serde(default)]
        delta: Option<Delta>,
        #[serde(default)]
        finish_reason: Option<String>,
    }

    #[derive(Deserialize)]
    struct Delta {
        #[serde(default)]
        content: Option<String>,
    }

    #[derive(Deserialize)]
    struct StreamErrorBody {
        #[serde(default)]
        message: String,
    }

    let parsed: StreamResponse =
        serde_json::from_str(data).map_err(|e| LLMError::ParseError(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(LLMError::ApiError {
            status: 200,
            message: err.message,
        });
    }

    let Some(choice) = parsed.choices.into_iter().next() else {
        return Ok(OpenAIStreamEvent::Skip);
    };

    let text = choice.delta.and_then(|d| d.content).unwrap_or_default();
    if !text.is_empty() {
        return Ok(OpenAIStreamEvent::Delta(text));
    }

    if choice.finish_reason.is_some() {
        Ok(OpenAIStreamEvent::Finished)
    } else {
        Ok(OpenAIStreamEvent::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAIClient::new("https://api.example.com/v1", "test-key", "gpt-4");
        assert_eq!(client.base_url, "https://api.example.com/v1");
        assert_eq!(client.model, "gpt-4");
        assert_eq!(client.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_cerebras_client() {
        let client = OpenAIClient::cerebras("test-key", "llama-4-scout-17b-16e-instruct");
        assert_eq!(client.base_url, "https://api.cerebras.ai/v1");
        assert_eq!(client.model, "llama-4-scout-17b-16e-instruct");
    }

    #[test]
    fn test_ollama_client() {
        let client = OpenAIClient::ollama("llama3");
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert!(client.api_key.is_empty());
    }

    #[test]
    fn test_url_trailing_slash_removed() {
        let client = OpenAIClient::new("https://api.example.com/v1/", "key", "model");
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_streaming_request_body() {
        let client = OpenAIClient::openai("key", "gpt-4o")
            .with_max_tokens(600)
            .with_temperature(0.2);
        let body = serde_json::to_value(client.request("hello", true)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 600);
        assert_eq!(body["stream"], true);

        let body = serde_json::to_value(client.request("hello", false)).unwrap();
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_parse_delta() {
        let block = r#"data: {"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        assert_eq!(
            parse_openai_sse_event(block).unwrap(),
            OpenAIStreamEvent::Delta("Hel".to_string())
        );
    }

    #[test]
    fn test_parse_role_announcement_skipped() {
        let block = r#"data: {"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        assert_eq!(parse_openai_sse_event(block).unwrap(), OpenAIStreamEvent::Skip);
    }

    #[test]
    fn test_parse_finish_and_done() {
        let block = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_openai_sse_event(block).unwrap(), OpenAIStreamEvent::Finished);
        assert_eq!(parse_openai_sse_event("data: [DONE]").unwrap(), OpenAIStreamEvent::Done);
    }

    #[test]
    fn test_parse_error_payload() {
        let block = r#"data: {"error":{"message":"context length exceeded"}}"#;
        let err = parse_openai_sse_event(block).unwrap_err();
        assert!(matches!(err, LLMError::ApiError { message, .. } if message == "context length exceeded"));
    }

    #[test]
    fn test_parse_malformed_payload() {
        let err = parse_openai_sse_event("data: {not json").unwrap_err();
        assert!(matches!(err, LLMError::ParseError(_)));
    }
}
