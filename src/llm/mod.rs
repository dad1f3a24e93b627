//! Completion provider abstraction
//!
//! A [`CompletionClient`] turns a prompt into a lazy stream of text deltas.
//! The stream is finite and cannot be restarted; dropping it releases the
//! underlying connection.

mod http_client;
mod openrouter;
mod types;

pub use http_client::create_streaming_client;
pub use openrouter::{delta_stream, OpenRouterClient};
pub use types::{ChatCompletionRequest, ChatMessage, ChatStreamChunk};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Ordered text deltas from the provider. An `Err` item ends the stream.
pub type DeltaStream = BoxStream<'static, Result<String>>;

/// Unified trait for streaming chat-completion backends
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Open a streaming completion for a single user prompt
    async fn stream_completion(&self, prompt: &str) -> Result<DeltaStream>;

    /// Model identifier, for logging and status
    fn model(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
