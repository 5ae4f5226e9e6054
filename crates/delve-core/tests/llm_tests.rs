use delve_core::config::DEFAULT_OLLAMA_MODEL;
use delve_core::llm::{Provider, StreamChunk};
use delve_core::{ClaudeClient, LLMConfig, LLMError, OpenAIClient, ScriptedLLM, LLM};
use tokio::sync::mpsc;

// Client construction
mod clients {
    use super::*;

    #[test]
    fn test_claude_client_supports_streaming() {
        let client = ClaudeClient::new("test-key")
            .with_model("claude-3-opus")
            .with_api_url("https://proxy.example.com/v1/messages");
        assert!(client.supports_streaming());
    }

    #[test]
    fn test_openai_compatible_clients_support_streaming() {
        assert!(OpenAIClient::cerebras("key", "llama-4-scout-17b-16e-instruct").supports_streaming());
        assert!(OpenAIClient::openrouter("key", "anthropic/claude-3-opus").supports_streaming());
        assert!(OpenAIClient::ollama("llama3").supports_streaming());
    }
}

// Provider tests
mod provider {
    use super::*;

    #[test]
    fn test_ollama_provider_build() {
        let provider = Provider::Ollama {
            base_url: "http://localhost:11434/v1".to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        };
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_anthropic_from_config_with_key() {
        let config = LLMConfig {
            provider: "claude".to_string(),
            api_key: Some("test".to_string()),
            ..Default::default()
        };
        let provider = Provider::from_config(&config).unwrap();
        assert!(matches!(provider, Provider::Anthropic { .. }));
        assert!(provider.build_with(&config).is_ok());
    }

    #[test]
    fn test_anthropic_without_key() {
        let provider = Provider::Anthropic {
            api_key: None,
            model: "claude-3-opus".to_string(),
            api_version: None,
        };
        assert!(matches!(provider.build(), Err(LLMError::MissingApiKey)));
    }

    #[test]
    fn test_openai_compatible_from_config() {
        let config = LLMConfig {
            provider: "openai-compatible".to_string(),
            base_url: Some("http://localhost:8080/v1".to_string()),
            model: Some("local-model".to_string()),
            ..Default::default()
        };
        let provider = Provider::from_config(&config).unwrap();
        assert!(matches!(
            &provider,
            Provider::OpenAI { base_url, model, .. }
                if base_url == "http://localhost:8080/v1" && model == "local-model"
        ));
        assert!(provider.build().is_ok());
    }
}

// Streaming contract
mod streaming {
    use super::*;

    #[tokio::test]
    async fn test_done_carries_concatenation() {
        let llm: Box<dyn LLM> = Box::new(ScriptedLLM::new(["one ", "two"]));
        let (tx, mut rx) = mpsc::channel(4);

        let full = llm.stream_complete("prompt", tx).await.unwrap();

        let mut last = None;
        while let Some(chunk) = rx.recv().await {
            last = Some(chunk);
        }
        assert_eq!(last, Some(StreamChunk::done("one two")));
        assert_eq!(full, "one two");
    }

    #[tokio::test]
    async fn test_dropped_receiver_cancels() {
        let llm = ScriptedLLM::new(["a", "b", "c"]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = llm.stream_complete("prompt", tx).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }
}

// Provider streams over a real socket
mod wire {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const OPENAI_FULL: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hé\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    const OPENAI_TRUNCATED: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n",
    );

    const CLAUDE_FULL: &str = concat!(
        "event: message_start\ndata: {\"type\":\"message_start\"}\n\n",
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hé\"}}\n\n",
        "event: ping\ndata: {\"type\":\"ping\"}\n\n",
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"llo\"}}\n\n",
        "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
    );

    const CLAUDE_TRUNCATED: &str = concat!(
        "event: message_start\ndata: {\"type\":\"message_start\"}\n\n",
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n",
    );

    /// Splits `body` inside the first multi-byte character so the client
    /// has to reassemble it across network reads.
    fn split_mid_char(body: &str) -> Vec<Vec<u8>> {
        let bytes = body.as_bytes();
        match body.find('é') {
            Some(pos) => vec![bytes[..pos + 1].to_vec(), bytes[pos + 1..].to_vec()],
            None => vec![bytes.to_vec()],
        }
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Serves one `text/event-stream` response, writing `body` in pieces
    /// and closing the connection afterwards. Returns the server address.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            read_request(&mut socket).await;

            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for part in split_mid_char(body) {
                if socket.write_all(&part).await.is_err() || socket.flush().await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}")
    }

    async fn drain(mut rx: mpsc::Receiver<StreamChunk>) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    fn openai(base: &str) -> OpenAIClient {
        OpenAIClient::new(format!("{base}/v1"), "", "test-model")
    }

    fn claude(base: &str) -> ClaudeClient {
        ClaudeClient::new("test-key").with_api_url(format!("{base}/v1/messages"))
    }

    #[tokio::test]
    async fn test_openai_full_stream() {
        let client = openai(&serve_once(OPENAI_FULL).await);
        let (tx, rx) = mpsc::channel(16);

        let result = client.stream_complete("hi", tx).await;

        assert_eq!(result.unwrap(), "Héllo");
        assert_eq!(
            drain(rx).await,
            vec![
                StreamChunk::text("Hé"),
                StreamChunk::text("llo"),
                StreamChunk::done("Héllo")
            ]
        );
    }

    #[tokio::test]
    async fn test_openai_truncated_stream_is_incomplete() {
        let client = openai(&serve_once(OPENAI_TRUNCATED).await);
        let (tx, rx) = mpsc::channel(16);

        let result = client.stream_complete("hi", tx).await;

        assert!(matches!(result, Err(LLMError::Incomplete)));
        assert_eq!(drain(rx).await, vec![StreamChunk::text("Hel")]);
    }

    #[tokio::test]
    async fn test_openai_dropped_receiver_cancels() {
        let client = openai(&serve_once(OPENAI_FULL).await);
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let result = client.stream_complete("hi", tx).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }

    #[tokio::test]
    async fn test_claude_full_stream() {
        let client = claude(&serve_once(CLAUDE_FULL).await);
        let (tx, rx) = mpsc::channel(16);

        let result = client.stream_complete("hi", tx).await;

        assert_eq!(result.unwrap(), "Héllo");
        assert_eq!(
            drain(rx).await,
            vec![
                StreamChunk::text("Hé"),
                StreamChunk::text("llo"),
                StreamChunk::done("Héllo")
            ]
        );
    }

    #[tokio::test]
    async fn test_claude_truncated_stream_is_incomplete() {
        let client = claude(&serve_once(CLAUDE_TRUNCATED).await);
        let (tx, rx) = mpsc::channel(16);

        let result = client.stream_complete("hi", tx).await;

        assert!(matches!(result, Err(LLMError::Incomplete)));
        assert_eq!(drain(rx).await, vec![StreamChunk::text("Hel")]);
    }

    #[tokio::test]
    async fn test_claude_dropped_receiver_cancels() {
        let client = claude(&serve_once(CLAUDE_FULL).await);
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let result = client.stream_complete("hi", tx).await;
        assert!(matches!(result, Err(LLMError::Cancelled)));
    }
}
