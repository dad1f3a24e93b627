//! HTTP server
//!
//! - GET /api/status - Health check
//! - POST /api/copycat - SSE streaming copycat detection
//! - GET/POST/DELETE /api/history - Per-visitor tweet history

mod handlers;
mod history;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::CopycatConfig;
use crate::history::HistoryStore;
use crate::llm::{CompletionClient, OpenRouterClient};

/// Sent as `x-api-version` on every response
pub const API_VERSION: &str = "1";

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; detection then answers 500
    pub completion: Option<Arc<dyn CompletionClient>>,
    /// `None` when no database is configured; history routes answer 503
    pub history: Option<Arc<HistoryStore>>,
    pub request_deadline: Duration,
}

impl AppState {
    pub fn new(
        completion: Option<Arc<dyn CompletionClient>>,
        history: Option<Arc<HistoryStore>>,
        request_deadline: Duration,
    ) -> Self {
        Self {
            completion,
            history,
            request_deadline,
        }
    }

    /// Build state from configuration. Missing credentials or database
    /// leave the corresponding feature disabled rather than failing startup.
    pub async fn from_config(config: &CopycatConfig) -> Result<Self> {
        let completion: Option<Arc<dyn CompletionClient>> = if config.has_completion_key() {
            Some(Arc::new(OpenRouterClient::from_config(config)?))
        } else {
            warn!("Detection disabled: OPENROUTER_API_KEY not configured");
            None
        };

        let history = match &config.database_url {
            Some(url) => Some(Arc::new(HistoryStore::connect(url).await?)),
            None => {
                info!("History disabled (COPYCAT_DATABASE_URL not set)");
                None
            }
        };

        Ok(Self::new(completion, history, config.request_deadline()))
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // API version header on all responses
    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/copycat", post(handlers::copycat_handler))
        .route(
            "/api/history",
            get(history::list_history)
                .post(history::create_history)
                .delete(history::delete_history),
        )
        .layer(version_header)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: &CopycatConfig) -> Result<()> {
    let state = AppState::from_config(config).await?;

    let model = state
        .completion
        .as_ref()
        .map(|c| c.model().to_string())
        .unwrap_or_else(|| "(unconfigured)".into());
    let history_enabled = state.history.is_some();

    let app = create_router(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        addr = %addr,
        model = %model,
        history = history_enabled,
        deadline_secs = config.request_deadline_secs,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
