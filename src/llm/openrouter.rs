//! OpenRouter provider implementation (Chat Completions API)
//!
//! Implements the OpenAI-compatible streaming Chat Completions API.
//! Uses core::SseDecoder for SSE stream parsing.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::fmt::Display;

use super::types::{ChatCompletionRequest, ChatStreamChunk};
use super::{create_streaming_client, CompletionClient, DeltaStream};
use crate::config::CopycatConfig;
use crate::core::SseDecoder;
use crate::error::{CopycatError, Result};

/// OpenRouter provider using Chat Completions API
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    referer: String,
    title: String,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Create a client from configuration.
    ///
    /// Fails with [`CopycatError::Config`] when no API key is configured,
    /// before any network activity.
    pub fn from_config(config: &CopycatConfig) -> Result<Self> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CopycatError::Config("OPENROUTER_API_KEY not configured".into()))?;

        Ok(Self {
            client: create_streaming_client(config.connect_timeout()),
            api_key,
            base_url: config.openrouter_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            referer: config.site_url.clone(),
            title: config.app_title.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn stream_completion(&self, prompt: &str) -> Result<DeltaStream> {
        let body = ChatCompletionRequest::streaming(&self.model, prompt);

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Opening OpenRouter stream");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("(failed to read body: {})", e));
            return Err(CopycatError::Upstream(format!(
                "OpenRouter API error {}: {}",
                status, text
            )));
        }

        Ok(delta_stream(response.bytes_stream()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}

/// Decode an OpenAI-compatible SSE byte stream into text deltas.
///
/// Empty deltas and undecodable frames are skipped. A transport error or an
/// in-band provider `error` object yields one `Err` and ends the stream, as
/// does the `[DONE]` sentinel (without an error).
pub fn delta_stream<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new();

        'read: while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(CopycatError::Stream(e.to_string()));
                    break 'read;
                }
            };

            for frame in decoder.push(chunk.as_ref()) {
                if frame.is_done() {
                    break 'read;
                }

                let chunk_data: ChatStreamChunk = match frame.try_parse() {
                    Some(c) => c,
                    None => {
                        tracing::trace!(data = %frame.preview(), "Skipping undecodable SSE frame");
                        continue;
                    }
                };

                if let Some(err) = &chunk_data.error {
                    tracing::warn!(code = ?err.code, message = %err.message, "Provider failed mid-stream");
                    yield Err(CopycatError::Upstream(err.message.clone()));
                    break 'read;
                }

                if let Some(content) = chunk_data.content() {
                    if !content.is_empty() {
                        yield Ok(content.to_string());
                    }
                }

                match chunk_data.finish_reason() {
                    Some("length") => tracing::warn!("Provider output truncated at the token limit"),
                    Some(reason) => tracing::debug!(finish_reason = reason, "Provider finished"),
                    None => {}
                }
            }
        }
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_chunks(parts: &[&str]) -> impl Stream<Item = std::result::Result<Vec<u8>, String>> + Send + 'static {
        let owned: Vec<std::result::Result<Vec<u8>, String>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    fn delta(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(content).unwrap()
        )
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = OpenRouterClient::from_config(&CopycatConfig::default()).unwrap_err();
        assert!(matches!(err, CopycatError::Config(_)));
        assert_eq!(err.to_user_string(), "OPENROUTER_API_KEY not configured");
    }

    #[test]
    fn test_endpoint_and_debug_hide_key() {
        let mut config = CopycatConfig::default();
        config.openrouter_api_key = Some("sk-or-secret".into());
        config.openrouter_base_url = "http://127.0.0.1:9/api/v1/".into();

        let client = OpenRouterClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/api/v1/chat/completions");
        assert_eq!(client.name(), "openrouter");
        assert!(!format!("{:?}", client).contains("sk-or-secret"));
    }

    #[tokio::test]
    async fn test_deltas_in_order_and_empty_skipped() {
        let body = format!(
            ": OPENROUTER PROCESSING\n\n{}{}{}{}data: [DONE]\n\n",
            delta("Hel"),
            delta(""),
            delta("lo"),
            delta(" world")
        );
        // Re-chunk at awkward boundaries
        let (a, rest) = body.split_at(30);
        let (b, c) = rest.split_at(41);

        let deltas: Vec<String> = delta_stream(byte_chunks(&[a, b, c]))
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Hel", "lo", " world"]);
    }

    #[tokio::test]
    async fn test_stops_at_done_sentinel() {
        let body = format!("{}data: [DONE]\n\n{}", delta("a"), delta("ignored"));
        let deltas: Vec<_> = delta_stream(byte_chunks(&[&body])).collect().await;
        assert_eq!(deltas.len(), 1);
    }

    #[tokio::test]
    async fn test_in_band_error_ends_stream() {
        let body = format!(
            "{}data: {{\"error\":{{\"code\":502,\"message\":\"Provider disconnected\"}}}}\n\n{}",
            delta("partial"),
            delta("never")
        );
        let items: Vec<_> = delta_stream(byte_chunks(&[&body])).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(&items[1], Err(CopycatError::Upstream(msg)) if msg == "Provider disconnected"));
    }

    #[tokio::test]
    async fn test_content_on_finishing_chunk_kept() {
        let body = format!(
            "{}data: {{\"choices\":[{{\"delta\":{{\"content\":\"end\"}},\"finish_reason\":\"length\"}}]}}\n\n",
            delta("start ")
        );
        let deltas: Vec<String> = delta_stream(byte_chunks(&[&body]))
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["start ", "end"]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(delta("one").into_bytes()),
            Err("connection reset".to_string()),
            Ok(delta("two").into_bytes()),
        ];
        let items: Vec<_> = delta_stream(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(CopycatError::Stream(msg)) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_garbage_frames_skipped() {
        let body = format!("data: {{not json\n\n{}", delta("ok"));
        let deltas: Vec<String> = delta_stream(byte_chunks(&[&body]))
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["ok"]);
    }
}
