//! History endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::AppState;
use crate::error::{CopycatError, Result};
use crate::history::{HistoryStore, NewHistoryEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub visitor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHistoryRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
}

fn store(state: &AppState) -> Result<Arc<HistoryStore>> {
    state.history.clone().ok_or(CopycatError::HistoryDisabled)
}

fn required(value: Option<String>, message: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CopycatError::InvalidInput(message.to_string()))
}

/// `GET /api/history?visitorId=...`
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>> {
    let visitor_id = required(query.visitor_id, "visitorId is required")?;
    let history = store(&state)?.list(&visitor_id).await?;
    Ok(Json(json!({ "history": history })))
}

/// `POST /api/history`
pub async fn create_history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewHistoryEntry>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(entry) = payload.map_err(|e| CopycatError::InvalidInput(e.body_text()))?;
    entry.validate()?;
    let id = store(&state)?.insert(&entry).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// `DELETE /api/history`
pub async fn delete_history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DeleteHistoryRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| CopycatError::InvalidInput(e.body_text()))?;
    let id = required(request.id, "id and visitorId are required")?;
    let visitor_id = required(request.visitor_id, "id and visitorId are required")?;

    let deleted = store(&state)?.delete(&id, &visitor_id).await?;
    if !deleted {
        tracing::debug!(id = %id, "Delete matched no history entry");
    }
    Ok(Json(json!({ "success": true })))
}
