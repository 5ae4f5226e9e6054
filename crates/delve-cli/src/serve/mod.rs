//! HTTP server exposing the research pipeline.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)

mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use delve_core::{Config, ResearchConfig, ResearchPipeline, SearchProvider, LLM};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
///
/// Providers hold only immutable settings and connection pools; every
/// request gets its own [`ResearchPipeline`].
pub struct AppState {
    pub search: Arc<dyn SearchProvider>,
    pub llm: Arc<dyn LLM>,
    pub policy: ResearchConfig,
}

impl AppState {
    /// Creates a fresh pipeline for one request.
    pub fn pipeline(&self) -> ResearchPipeline {
        ResearchPipeline::with_policy(self.search.clone(), self.llm.clone(), self.policy.clone())
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the application router.
pub fn router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/research", post(handlers::research))
        .route("/research/sync", post(handlers::research_sync))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Start the research server.
pub async fn start_server(
    config: Config,
    search: Arc<dyn SearchProvider>,
    llm: Arc<dyn LLM>,
) -> color_eyre::Result<()> {
    let state = Arc::new(AppState {
        search,
        llm,
        policy: config.research.clone(),
    });

    let app = router(state, &config.server.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| eyre!("invalid bind address: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    info!(%addr, "delve research server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
