// src/llm/http_client.rs
// Shared HTTP client for the completion provider

use std::time::Duration;

/// Create the HTTP client used for streaming completions.
///
/// Only the connect phase is bounded here. Streaming bodies can legitimately
/// run for a long time, so the overall deadline is enforced per request by
/// the stream relay instead of a client-wide timeout.
pub fn create_streaming_client(connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}
