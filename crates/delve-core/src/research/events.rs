use serde::{Deserialize, Serialize};

/// Message sent in the final `complete` event.
pub const COMPLETE_MESSAGE: &str = "Research completed successfully!";

/// Message sent when no search result passed the relevance filter.
pub const NO_SOURCES_MESSAGE: &str = "No relevant sources found";

/// One frame of the research progress stream.
///
/// Serialized with a `type` discriminator, e.g.
/// `{"type":"search_complete","sources_found":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Start {
        query: String,
    },
    SearchStart,
    SearchResult {
        title: String,
        url: String,
        /// 1-based position in the unfiltered result list.
        index: usize,
        /// Number of unfiltered results.
        total: usize,
    },
    SearchComplete {
        sources_found: usize,
    },
    Error {
        message: String,
    },
    AnalysisStart,
    AiThinking,
    AiChunk {
        content: String,
    },
    AiError {
        error: String,
    },
    AnalysisComplete {
        summary: String,
        sources_count: usize,
    },
    Complete {
        query: String,
        summary: String,
        sources_count: usize,
        message: String,
    },
}

impl ProgressEvent {
    /// The `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Start { .. } => "start",
            ProgressEvent::SearchStart => "search_start",
            ProgressEvent::SearchResult { .. } => "search_result",
            ProgressEvent::SearchComplete { .. } => "search_complete",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::AnalysisStart => "analysis_start",
            ProgressEvent::AiThinking => "ai_thinking",
            ProgressEvent::AiChunk { .. } => "ai_chunk",
            ProgressEvent::AiError { .. } => "ai_error",
            ProgressEvent::AnalysisComplete { .. } => "analysis_complete",
            ProgressEvent::Complete { .. } => "complete",
        }
    }

    /// Whether the stream ends after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. } | ProgressEvent::AiError { .. }
        )
    }

    /// Encodes the event as a `text/event-stream` frame: `data: <json>\n\n`.
    pub fn sse_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}
