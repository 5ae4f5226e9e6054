use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::config::ResearchConfig;
use crate::llm::{LLMError, StreamChunk, LLM};
use crate::research::events::{ProgressEvent, COMPLETE_MESSAGE, NO_SOURCES_MESSAGE};
use crate::research::prompts::ResearchContext;
use crate::research::source::{select_sources, Source};
use crate::search::{SearchError, SearchProvider};

/// Errors that can end a research run.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("{}", NO_SOURCES_MESSAGE)]
    NoSources,

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("AI provider error: {0}")]
    LLM(#[from] LLMError),

    #[error("Client disconnected")]
    Disconnected,

    #[error("Not supported: {0}")]
    Unsupported(String),
}

impl ResearchError {
    /// The terminal event reported to the client for this failure, if any.
    pub fn to_event(&self) -> Option<ProgressEvent> {
        match self {
            ResearchError::NoSources | ResearchError::Search(_) => Some(ProgressEvent::Error {
                message: self.to_string(),
            }),
            ResearchError::LLM(err) => Some(ProgressEvent::AiError {
                error: err.to_string(),
            }),
            _ => None,
        }
    }
}

/// A source reference kept in the non-streaming report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Result of a research run consumed to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub query: String,
    /// The full synthesis response.
    pub summary: String,
    pub sources_count: usize,
    pub sources: Vec<SourceRef>,
}

/// Sending half of the progress stream.
struct Emitter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl Emitter {
    async fn emit(&self, event: ProgressEvent) -> Result<(), ResearchError> {
        debug!(event = event.kind(), "emit");
        self.tx
            .send(event)
            .await
            .map_err(|_| ResearchError::Disconnected)
    }

    /// Emits the terminal event for `err` and hands the error back.
    async fn fail(&self, err: ResearchError) -> ResearchError {
        if let Some(event) = err.to_event() {
            if self.emit(event).await.is_err() {
                return ResearchError::Disconnected;
            }
        }
        err
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

/// Orchestrates search, filtering, prompt assembly and streamed synthesis
/// for one query.
pub struct ResearchPipeline {
    search: Arc<dyn SearchProvider>,
    llm: Arc<dyn LLM>,
    policy: ResearchConfig,
}

impl ResearchPipeline {
    /// Creates a pipeline with the default policy.
    pub fn new(search: Arc<dyn SearchProvider>, llm: Arc<dyn LLM>) -> Self {
        Self::with_policy(search, llm, ResearchConfig::default())
    }

    /// Creates a pipeline with an explicit policy.
    pub fn with_policy(
        search: Arc<dyn SearchProvider>,
        llm: Arc<dyn LLM>,
        policy: ResearchConfig,
    ) -> Self {
        Self {
            search,
            llm,
            policy,
        }
    }

    /// Starts a research run and returns its progress stream.
    ///
    /// The run executes on its own task and pauses whenever the stream's
    /// buffer is full. Dropping the stream stops the run at the next
    /// provider call or event.
    pub fn run(self, query: &str) -> Result<ReceiverStream<ProgressEvent>, ResearchError> {
        let query = validate_query(query)?;
        let (tx, rx) = mpsc::channel(self.policy.event_buffer.max(1));

        tokio::spawn(async move {
            let events = Emitter { tx };
            match self.drive(&query, &events).await {
                Ok(()) => info!(query = %query, "research completed"),
                Err(ResearchError::Disconnected) => {
                    info!(query = %query, "client disconnected, research abandoned")
                }
                Err(err) => warn!(query = %query, error = %err, "research failed"),
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Runs research to the end and returns the final report.
    ///
    /// This is the non-streaming variant: progress events are consumed
    /// internally and failures come back as typed errors.
    pub async fn run_to_completion(&self, query: &str) -> Result<ResearchReport, ResearchError> {
        let query = validate_query(query)?;
        let (tx, mut rx) = mpsc::channel(self.policy.event_buffer.max(1));

        let drive = async move {
            let events = Emitter { tx };
            self.drive(&query, &events).await
        };

        let collect = async move {
            let mut sources = Vec::new();
            let mut report = None;
            while let Some(event) = rx.recv().await {
                match event {
                    ProgressEvent::SearchResult { title, url, .. } => {
                        sources.push(SourceRef { title, url })
                    }
                    ProgressEvent::Complete {
                        query,
                        summary,
                        sources_count,
                        ..
                    } => {
                        report = Some((query, summary, sources_count));
                    }
                    _ => {}
                }
            }
            (sources, report)
        };

        let (outcome, (sources, report)) = tokio::join!(drive, collect);
        outcome?;

        let (query, summary, sources_count) = report.ok_or(ResearchError::Disconnected)?;
        Ok(ResearchReport {
            query,
            summary,
            sources_count,
            sources,
        })
    }

    /// Multi-step research. Not implemented yet; kept as an extension point.
    pub async fn deep_research(&self, _query: &str) -> Result<ResearchReport, ResearchError> {
        Err(ResearchError::Unsupported("deep research".to_string()))
    }

    async fn drive(&self, query: &str, events: &Emitter) -> Result<(), ResearchError> {
        info!(query = %query, "research started");
        events
            .emit(ProgressEvent::Start {
                query: query.to_string(),
            })
            .await?;

        // 1. Search
        events.emit(ProgressEvent::SearchStart).await?;
        let documents = tokio::select! {
            result = self.search.search(query, self.policy.num_results) => result,
            _ = events.closed() => return Err(ResearchError::Disconnected),
        };
        let documents = match documents {
            Ok(documents) => documents,
            Err(err) => return Err(events.fail(err.into()).await),
        };

        // 2. Filter
        let sources = select_sources(&documents, self.policy.min_source_chars);
        debug!(
            returned = documents.len(),
            dropped = documents.len() - sources.len(),
            "filtered search results"
        );
        for source in &sources {
            events.emit(search_result_event(source)).await?;
        }
        events
            .emit(ProgressEvent::SearchComplete {
                sources_found: sources.len(),
            })
            .await?;
        info!(query = %query, sources_found = sources.len(), "search complete");

        if sources.is_empty() {
            return Err(events.fail(ResearchError::NoSources).await);
        }

        // 3. Prompt
        events.emit(ProgressEvent::AnalysisStart).await?;
        let prompt = ResearchContext::new(query, &sources).to_prompt();

        // 4. Synthesis
        events.emit(ProgressEvent::AiThinking).await?;
        let summary = tokio::select! {
            result = self.synthesize(&prompt, events) => result,
            _ = events.closed() => return Err(ResearchError::Disconnected),
        };
        let summary = match summary {
            Ok(summary) => summary,
            Err(err @ ResearchError::LLM(_)) => return Err(events.fail(err).await),
            Err(err) => return Err(err),
        };

        // 5. Completion
        events
            .emit(ProgressEvent::AnalysisComplete {
                summary: summary.clone(),
                sources_count: sources.len(),
            })
            .await?;
        events
            .emit(ProgressEvent::Complete {
                query: query.to_string(),
                summary,
                sources_count: sources.len(),
                message: COMPLETE_MESSAGE.to_string(),
            })
            .await
    }

    /// Streams the completion, forwarding each fragment as an `ai_chunk`.
    ///
    /// Returns the concatenation of every forwarded fragment.
    async fn synthesize(&self, prompt: &str, events: &Emitter) -> Result<String, ResearchError> {
        let (chunk_tx, mut chunk_rx) = mpsc::channel(self.policy.event_buffer.max(1));

        if !self.llm.supports_streaming() {
            debug!("model answers in one piece; expect a single ai_chunk");
        }
        let producer = self.llm.stream_complete(prompt, chunk_tx);

        let forward = async move {
            let mut full = String::new();
            let mut chunks = 0usize;
            while let Some(chunk) = chunk_rx.recv().await {
                match chunk {
                    StreamChunk::Text(text) if text.is_empty() => {}
                    StreamChunk::Text(text) => {
                        full.push_str(&text);
                        chunks += 1;
                        events.emit(ProgressEvent::AiChunk { content: text }).await?;
                    }
                    StreamChunk::Done(_) => {}
                }
            }
            debug!(chunks, chars = full.len(), "completion forwarded");
            Ok::<_, ResearchError>(full)
        };

        let (produced, forwarded) = tokio::join!(producer, forward);
        let full = forwarded?;

        match produced {
            Ok(_) => Ok(full),
            Err(LLMError::Cancelled) => Err(ResearchError::Disconnected),
            Err(err) => {
                warn!(error = %err, "completion failed");
                Err(ResearchError::LLM(err))
            }
        }
    }
}

fn validate_query(query: &str) -> Result<String, ResearchError> {
    if query.trim().is_empty() {
        return Err(ResearchError::EmptyQuery);
    }
    Ok(query.to_string())
}

fn search_result_event(source: &Source) -> ProgressEvent {
    ProgressEvent::SearchResult {
        title: source.title.clone(),
        url: source.url.clone(),
        index: source.index,
        total: source.total,
    }
}
