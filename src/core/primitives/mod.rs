//! Core primitives - shared utilities for copycat
//!
//! - **streaming**: SSE decoder

pub mod streaming;

pub use streaming::{SseDecoder, SseFrame};
