//! Core primitives shared by the server, the completion client, and the CLI
//!
//! - **primitives::streaming**: buffered SSE decoder used on both sides of the wire

pub mod primitives;

pub use primitives::{SseDecoder, SseFrame};
