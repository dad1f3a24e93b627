// src/error.rs
// Standardized error types for copycat

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the copycat library
#[derive(Error, Debug)]
pub enum CopycatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("history store not configured")]
    HistoryDisabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using CopycatError
pub type Result<T> = std::result::Result<T, CopycatError>;

impl CopycatError {
    /// HTTP status used when this error ends a request before streaming starts
    pub fn status_code(&self) -> StatusCode {
        match self {
            CopycatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CopycatError::HistoryDisabled => StatusCode::SERVICE_UNAVAILABLE,
            CopycatError::Upstream(_) | CopycatError::Http(_) | CopycatError::Stream(_) => {
                StatusCode::BAD_GATEWAY
            }
            CopycatError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API callers.
    ///
    /// Validation and configuration errors carry a message that is already
    /// written for the caller, so they are passed through without a prefix.
    pub fn to_user_string(&self) -> String {
        match self {
            CopycatError::InvalidInput(msg)
            | CopycatError::Config(msg)
            | CopycatError::Upstream(msg)
            | CopycatError::Stream(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for CopycatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_user_string() }))).into_response()
    }
}
