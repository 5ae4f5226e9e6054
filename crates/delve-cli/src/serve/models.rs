//! API request/response models for the research server.
//!
//! These are Data Transfer Objects (DTOs) that define the shape of
//! JSON bodies exchanged with the frontend.

use serde::{Deserialize, Serialize};

// =============================================================================
// Research Models (for `/research` and `/research/sync`)
// =============================================================================

/// Body of a research request.
#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    /// Natural-language research query.
    pub query: String,
    /// Where to research. Only "web" exists today; other values are
    /// accepted and echoed back unchanged.
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "web".to_string()
}

/// Non-streaming research response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResearchResponse {
    /// Full synthesis on success, otherwise the failure message.
    pub result: String,
    /// Echo of the request's `source`.
    pub source: String,
}

// =============================================================================
// Misc Models
// =============================================================================

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
