//! Stream relay: provider deltas in, detection events out
//!
//! The relay is a single cooperative stream. It opens the provider stream,
//! forwards each non-empty delta as a `chunk` event while accumulating it, and
//! finishes with exactly one terminal event: `done` with the extracted result,
//! or `error`. Dropping the relay (client disconnect) drops the provider
//! stream with it.

use futures::{Stream, StreamExt};
use std::future::Future;
use std::time::{Duration, Instant};

use super::extract::extract_result;
use super::types::StreamEvent;
use crate::error::{CopycatError, Result};
use crate::llm::DeltaStream;

/// Stand-in for deadlines too large to represent as an [`Instant`]
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Absolute deadline for a request, saturating at [`FAR_FUTURE`] past `started`
fn deadline_instant(started: Instant, deadline: Duration) -> tokio::time::Instant {
    let at = started
        .checked_add(deadline)
        .unwrap_or_else(|| started + FAR_FUTURE);
    tokio::time::Instant::from_std(at)
}

/// Relay a provider stream into detection events.
///
/// `open` is awaited inside the returned stream, so connection and HTTP
/// failures surface as an `error` event rather than failing the caller.
/// `started` is when the request arrived; `deadline` bounds the whole
/// request measured from that instant.
pub fn relay<F>(
    request_id: String,
    open: F,
    started: Instant,
    deadline: Duration,
) -> impl Stream<Item = StreamEvent> + Send + 'static
where
    F: Future<Output = Result<DeltaStream>> + Send + 'static,
{
    async_stream::stream! {
        let deadline_at = deadline_instant(started, deadline);

        let terminal = match tokio::time::timeout_at(deadline_at, open).await {
            Err(_) => Err(CopycatError::Timeout(deadline)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(mut deltas)) => {
                let mut accumulated = String::new();
                let mut chunks = 0usize;

                let outcome = loop {
                    match tokio::time::timeout_at(deadline_at, deltas.next()).await {
                        Err(_) => break Err(CopycatError::Timeout(deadline)),
                        Ok(None) => break Ok(()),
                        Ok(Some(Err(e))) => break Err(e),
                        Ok(Some(Ok(delta))) => {
                            if delta.is_empty() {
                                continue;
                            }
                            accumulated.push_str(&delta);
                            chunks += 1;
                            yield StreamEvent::chunk(delta);
                        }
                    }
                };

                // Release the provider connection before extraction
                drop(deltas);

                outcome.map(|()| {
                    tracing::debug!(
                        request_id = %request_id,
                        chunks,
                        content_len = accumulated.len(),
                        "Provider stream finished"
                    );
                    extract_result(&accumulated)
                })
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        match terminal {
            Ok(result) => {
                tracing::info!(
                    request_id = %request_id,
                    duration_ms = elapsed_ms,
                    fallback = result.is_fallback(),
                    "Detection stream completed"
                );
                yield StreamEvent::done(result, elapsed_ms);
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    duration_ms = elapsed_ms,
                    error = %e,
                    "Detection stream failed"
                );
                yield StreamEvent::error(e.to_user_string());
            }
        }
    }
}
