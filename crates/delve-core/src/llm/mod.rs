mod claude;
mod error;
mod openai;
mod provider;
mod scripted;
mod sse;

pub use claude::ClaudeClient;
pub use error::LLMError;
pub use openai::OpenAIClient;
pub use provider::Provider;
pub use scripted::ScriptedLLM;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A piece of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// An incremental text fragment.
    Text(String),
    /// End of stream, carrying the concatenation of every fragment.
    Done(String),
}

impl StreamChunk {
    /// Create a new text chunk.
    pub fn text(text: impl Into<String>) -> Self {
        StreamChunk::Text(text.into())
    }

    /// Create the completion marker.
    pub fn done(full: impl Into<String>) -> Self {
        StreamChunk::Done(full.into())
    }
}

/// Trait for Large Language Model providers.
///
/// This abstraction allows swapping between different LLM providers
/// without changing the rest of the code.
///
/// # Supported Providers
///
/// - **OpenAI-compatible**: OpenAI, Cerebras, Ollama, OpenRouter, vLLM, etc.
/// - **Anthropic**: Claude models via Anthropic API
/// - **Scripted**: fixed fragments, for tests and offline runs
///
/// # Example
///
/// ```ignore
/// use delve_core::llm::{Provider, LLM};
///
/// let llm = Provider::from_config(&config.llm).build()?;
/// let response = llm.complete("Hello!").await?;
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Complete a prompt and return the response.
    async fn complete(&self, prompt: &str) -> Result<String, LLMError>;

    /// Stream a completion.
    ///
    /// Sends a [`StreamChunk::Text`] through `tx` for every fragment as it
    /// arrives, then a single [`StreamChunk::Done`], and returns the full
    /// text. On a provider fault the error is returned and `Done` is never
    /// sent. If the receiver goes away the call stops reading and returns
    /// [`LLMError::Cancelled`].
    ///
    /// Default implementation falls back to non-streaming and sends
    /// the entire response as a single chunk.
    async fn stream_complete(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamChunk>,
    ) -> Result<String, LLMError> {
        let response = self.complete(prompt).await?;
        if !response.is_empty() {
            tx.send(StreamChunk::text(response.clone()))
                .await
                .map_err(|_| LLMError::Cancelled)?;
        }
        tx.send(StreamChunk::done(response.clone()))
            .await
            .map_err(|_| LLMError::Cancelled)?;
        Ok(response)
    }

    /// Returns true if this provider supports streaming.
    fn supports_streaming(&self) -> bool {
        false
    }
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl LLM for Box<dyn LLM> {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).complete(prompt).await
    }

    async fn stream_complete(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamChunk>,
    ) -> Result<String, LLMError> {
        (**self).stream_complete(prompt, tx).await
    }

    fn supports_streaming(&self) -> bool {
        (**self).supports_streaming()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LLM for Echo {
        async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test]
    async fn test_default_stream_falls_back_to_complete() {
        let (tx, mut rx) = mpsc::channel(4);
        let full = Echo.stream_complete("hi", tx).await.unwrap();

        assert_eq!(full, "echo: hi");
        assert_eq!(rx.recv().await, Some(StreamChunk::text("echo: hi")));
        assert_eq!(rx.recv().await, Some(StreamChunk::done("echo: hi")));
        assert_eq!(rx.recv().await, None);
        assert!(!Echo.supports_streaming());
    }

    #[tokio::test]
    async fn test_default_stream_cancelled_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = Echo.stream_complete("hi", tx).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }
}
