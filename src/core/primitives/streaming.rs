//! SSE (Server-Sent Events) streaming utilities
//!
//! Provides a reusable SSE decoder for processing streaming responses.
//! Used by the OpenRouter completion client (upstream) and by the
//! detection stream reader (downstream).

use serde::de::DeserializeOwned;

use crate::error::{CopycatError, Result};

// ============================================================================
// SSE Decoder
// ============================================================================

/// SSE stream decoder with buffering
///
/// Handles partial chunks and extracts complete SSE data lines. Bytes are
/// buffered until a newline arrives, so a multi-byte character or an event
/// split across two reads is reassembled before decoding.
/// Buffer is bounded to prevent unbounded memory growth.
///
/// # Example
/// ```ignore
/// let mut decoder = SseDecoder::new();
///
/// while let Some(chunk) = stream.next().await {
///     for frame in decoder.push(&chunk?) {
///         if frame.is_done() { break; }
///         let data: MyType = frame.parse()?;
///         // process data
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Maximum buffer size (1MB) - prevents unbounded growth from malformed streams
    const MAX_BUFFER_SIZE: usize = 1024 * 1024;

    /// Create a new SSE decoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Push a chunk of bytes and extract complete SSE frames
    ///
    /// Returns the complete `data:` frames in arrival order. Incomplete data
    /// is buffered for the next push. Comment lines (`:`), `event:`, `id:`
    /// and `retry:` fields are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.buffer[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.buffer[consumed..end]);
            consumed = end + 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                frames.push(SseFrame {
                    data: data.strip_prefix(' ').unwrap_or(data).to_string(),
                });
            }
        }

        self.buffer.drain(..consumed);

        // Safety: prevent unbounded buffer growth from a stream that never sends a newline
        if self.buffer.len() > Self::MAX_BUFFER_SIZE {
            tracing::warn!(
                "SSE buffer exceeded {}KB limit, discarding partial line",
                Self::MAX_BUFFER_SIZE / 1024
            );
            self.buffer.clear();
        }

        frames
    }

    /// Push a string directly (for testing or pre-decoded content)
    pub fn push_str(&mut self, s: &str) -> Vec<SseFrame> {
        self.push(s.as_bytes())
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Check if there's remaining buffered data
    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty()
    }
}

// ============================================================================
// SSE Frame
// ============================================================================

/// A complete SSE frame (data line)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// The data content (without "data: " prefix)
    pub data: String,
}

impl SseFrame {
    /// Check if this is the [DONE] sentinel
    pub fn is_done(&self) -> bool {
        self.data == "[DONE]"
    }

    /// Parse the frame data as JSON
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).map_err(|e| {
            CopycatError::Stream(format!("SSE JSON parse error: {}. Data: {}", e, self.preview()))
        })
    }

    /// Try to parse the frame data as JSON, returning None on failure
    pub fn try_parse<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.data).ok()
    }

    /// Get a preview of the data (first 200 chars) for error messages
    pub fn preview(&self) -> String {
        match self.data.char_indices().nth(200) {
            Some((idx, _)) => format!("{}...", &self.data[..idx]),
            None => self.data.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_basic_decode() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push_str("data: {\"text\": \"hello\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"text\": \"hello\"}");
        assert!(!decoder.has_remaining());
    }

    #[test]
    fn test_done_frame() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push_str("data: [DONE]\n");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_done());
    }

    #[test]
    fn test_partial_chunks() {
        let mut decoder = SseDecoder::new();

        // First chunk: incomplete line
        let frames1 = decoder.push_str("data: {\"part\":");
        assert!(frames1.is_empty());
        assert!(decoder.has_remaining());

        // Second chunk: completes the line
        let frames2 = decoder.push_str(" 1}\n");
        assert_eq!(frames2.len(), 1);
        assert_eq!(frames2[0].data, "{\"part\": 1}");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let line = "data: {\"content\":\"caf\u{e9} \u{1f408}\"}\n".as_bytes();

        // Split inside the cat emoji
        let split = line.len() - 5;
        assert!(decoder.push(&line[..split]).is_empty());
        let frames = decoder.push(&line[split..]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"content\":\"caf\u{e9} \u{1f408}\"}");
    }

    #[test]
    fn test_multiple_frames() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push_str("data: first\ndata: second\ndata: third\n");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data, "first");
        assert_eq!(frames[1].data, "second");
        assert_eq!(frames[2].data, "third");
    }

    #[test]
    fn test_empty_lines_and_comments_ignored() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push_str("\n\n: OPENROUTER PROCESSING\nevent: message\ndata: content\n\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "content");
    }

    #[test]
    fn test_data_without_space() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push_str("data:{\"a\":1}\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_oversized_partial_line_discarded() {
        let mut decoder = SseDecoder::new();
        let junk = vec![b'x'; SseDecoder::MAX_BUFFER_SIZE + 1];
        assert!(decoder.push(&junk).is_empty());
        assert!(!decoder.has_remaining());

        let frames = decoder.push_str("data: ok\n");
        assert_eq!(frames[0].data, "ok");
    }

    #[test]
    fn test_parse_json() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestData {
            value: i32,
        }

        let mut decoder = SseDecoder::new();
        let frames = decoder.push_str("data: {\"value\": 42}\n");

        let parsed: TestData = frames[0].parse().unwrap();
        assert_eq!(parsed.value, 42);
    }

    #[test]
    fn test_try_parse_invalid() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push_str("data: not-json\n");

        let result: Option<serde_json::Value> = frames[0].try_parse();
        assert!(result.is_none());
        assert!(frames[0].parse::<serde_json::Value>().is_err());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let frame = SseFrame {
            data: "\u{e9}".repeat(300),
        };
        let preview = frame.preview();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 203);
    }
}
