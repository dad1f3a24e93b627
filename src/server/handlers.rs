//! HTTP handlers for status and copycat detection

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::AppState;
use crate::detect::{build_detection_prompt, relay, DetectionPayload, DetectionRequest, StreamEvent};
use crate::error::{CopycatError, Result};

/// Interval between SSE comment frames while the model is thinking
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Health check and status endpoint
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.completion.as_ref().map(|c| c.model().to_string()),
        "completionConfigured": state.completion.is_some(),
        "historyEnabled": state.history.is_some(),
    }))
}

/// `POST /api/copycat`
///
/// Validation and configuration failures answer with a JSON error before any
/// streaming starts. Everything after that, including upstream failures,
/// arrives as SSE events on a 200 response.
pub async fn copycat_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DetectionPayload>, JsonRejection>,
) -> Result<Response> {
    let started = Instant::now();

    let Json(payload) = payload.map_err(|e| CopycatError::InvalidInput(e.body_text()))?;
    let request = DetectionRequest::try_from(payload)?;

    let client = state
        .completion
        .clone()
        .ok_or_else(|| CopycatError::Config("OPENROUTER_API_KEY not configured".into()))?;

    let request_id = uuid::Uuid::new_v4().to_string();
    let prompt = build_detection_prompt(&request);

    info!(
        request_id = %request_id,
        provider = client.name(),
        model = %client.model(),
        has_text = request.original_text().is_some(),
        has_url = request.original_url().is_some(),
        prompt_len = prompt.len(),
        "Starting copycat detection"
    );

    let open = async move { client.stream_completion(&prompt).await };
    let events = relay(request_id, open, started, state.request_deadline);

    let sse = Sse::new(sse_events(events))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("keep-alive"));

    Ok((
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        sse,
    )
        .into_response())
}

/// Serialize detection events as `data:` frames
fn sse_events(
    events: impl Stream<Item = StreamEvent> + Send + 'static,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> + Send + 'static {
    events.map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize stream event");
            json!({"type": "error", "error": "failed to serialize event"}).to_string()
        });
        Ok(Event::default().data(data))
    })
}
