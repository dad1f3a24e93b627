// src/remote.rs
// HTTP client for a running copycat server (used by the CLI)

use serde::Deserialize;
use serde_json::Value;

use crate::detect::{read_detection_stream_with, DetectionOutcome, DetectionPayload};
use crate::error::{CopycatError, Result};
use crate::history::{HistoryEntry, NewHistoryEntry};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Debug, Deserialize)]
struct HistoryList {
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run a detection and consume its event stream, calling `on_chunk` with
    /// each piece of model output as it arrives.
    pub async fn detect<F>(&self, payload: &DetectionPayload, on_chunk: F) -> Result<DetectionOutcome>
    where
        F: FnMut(&str),
    {
        let response = self
            .client
            .post(self.url("/api/copycat"))
            .json(payload)
            .send()
            .await?;
        let response = check_status(response).await?;
        read_detection_stream_with(response.bytes_stream(), on_chunk).await
    }

    pub async fn list_history(&self, visitor_id: &str) -> Result<Vec<HistoryEntry>> {
        let response = self
            .client
            .get(self.url("/api/history"))
            .query(&[("visitorId", visitor_id)])
            .send()
            .await?;
        let list: HistoryList = check_status(response).await?.json().await?;
        Ok(list.history)
    }

    pub async fn add_history(&self, entry: &NewHistoryEntry) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/history"))
            .json(entry)
            .send()
            .await?;
        let created: Created = check_status(response).await?.json().await?;
        Ok(created.id)
    }

    pub async fn delete_history(&self, id: &str, visitor_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/api/history"))
            .json(&serde_json::json!({ "id": id, "visitorId": visitor_id }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into an error carrying the server's `error` message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("server returned {}: {}", status, body));

    if status.is_client_error() {
        Err(CopycatError::InvalidInput(message))
    } else {
        Err(CopycatError::Upstream(message))
    }
}
