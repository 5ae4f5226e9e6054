//! HTTP route handlers for the research server.
//!
//! Handlers are kept thin, delegating the research itself to
//! [`delve_core::ResearchPipeline`].

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use tracing::{info, warn};

use delve_core::{ProgressEvent, ResearchError};

use super::models::{
    ErrorBody, HealthResponse, ResearchRequest, ResearchResponse, RootMessage,
};
use super::AppState;

// =============================================================================
// Errors
// =============================================================================

/// Failures surfaced as plain HTTP responses instead of stream events.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unusable (400).
    BadRequest(String),
    /// A provider failed while serving the non-streaming variant (502).
    Upstream { message: String, source: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            ApiError::Upstream { message, source } => (
                StatusCode::BAD_GATEWAY,
                Json(ResearchResponse {
                    result: message,
                    source,
                }),
            )
                .into_response(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET `/` - Liveness message.
pub async fn root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "Hello World",
    })
}

/// GET `/health` - Status and version.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST `/research` - Streams research progress as server-sent events.
///
/// Each event is one `data: <json>\n\n` frame; the stream closes after
/// `complete`, `error` or `ai_error`.
pub async fn research(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(query = %request.query, source = %request.source, "research requested");

    let events = state.pipeline().run(&request.query).map_err(|err| match err {
        ResearchError::EmptyQuery => ApiError::BadRequest(err.to_string()),
        other => ApiError::Upstream {
            message: other.to_string(),
            source: request.source.clone(),
        },
    })?;

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(sse_events(events)),
    ))
}

/// POST `/research/sync` - Runs research to completion and returns the
/// whole synthesis at once.
pub async fn research_sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    info!(query = %request.query, source = %request.source, "sync research requested");

    match state.pipeline().run_to_completion(&request.query).await {
        Ok(report) => Ok(Json(ResearchResponse {
            result: report.summary,
            source: request.source,
        })),
        Err(ResearchError::EmptyQuery) => {
            Err(ApiError::BadRequest(ResearchError::EmptyQuery.to_string()))
        }
        Err(err) => {
            warn!(error = %err, "sync research failed");
            Err(ApiError::Upstream {
                message: err.to_string(),
                source: request.source,
            })
        }
    }
}

/// Maps progress events onto SSE frames.
///
/// An event that cannot be serialized is skipped with a warning rather
/// than ending the stream early.
fn sse_events(
    events: impl Stream<Item = ProgressEvent> + Send + 'static,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    events.filter_map(|event| async move {
        match Event::default().json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(err) => {
                warn!(event = event.kind(), error = %err, "dropping unserializable event");
                None
            }
        }
    })
}
