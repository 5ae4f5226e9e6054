use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{LLMError, StreamChunk, LLM};

/// A deterministic LLM that replays fixed fragments.
///
/// Used by tests and by the `scripted` provider for offline runs. With
/// [`ScriptedLLM::failing_after`] it emits the first `n` fragments and
/// then fails the way a dropped provider connection would.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLLM {
    fragments: Vec<String>,
    fail_after: Option<usize>,
}

impl ScriptedLLM {
    /// Creates a scripted LLM that streams `fragments` in order.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_after: None,
        }
    }

    /// Fails with a network error after `n` fragments have been sent.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    fn failure(&self) -> LLMError {
        LLMError::Network("scripted provider failure".to_string())
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn complete(&self, _prompt: &str) -> Result<String, LLMError> {
        if self.fail_after.is_some() {
            return Err(self.failure());
        }
        Ok(self.fragments.concat())
    }

    async fn stream_complete(
        &self,
        _prompt: &str,
        tx: mpsc::Sender<StreamChunk>,
    ) -> Result<String, LLMError> {
        let mut full = String::new();

        for (i, fragment) in self.fragments.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(self.failure());
            }
            full.push_str(fragment);
            tx.send(StreamChunk::text(fragment.clone()))
                .await
                .map_err(|_| LLMError::Cancelled)?;
            tokio::task::yield_now().await;
        }

        if self.fail_after.is_some_and(|n| n >= self.fragments.len()) {
            return Err(self.failure());
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
