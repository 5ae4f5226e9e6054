use thiserror::Error;

/// Errors raised while retrieving search results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing search API key. Set EXA_API_KEY or DELVE_SEARCH_API_KEY.")]
    MissingApiKey,

    #[error("Unknown search provider: {0}")]
    UnknownProvider(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Search provider rate limited the request")]
    RateLimited,

    #[error("Search API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(err.to_string())
    }
}
