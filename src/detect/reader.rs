//! Consumer side of the detection stream
//!
//! Reads the SSE body produced by `POST /api/copycat`, tolerating event lines
//! split across network reads, and resolves to the final result or the
//! server-reported error.

use futures::{Stream, StreamExt};
use std::fmt::Display;

use super::types::{DetectionResult, StreamEvent};
use crate::core::SseDecoder;
use crate::error::{CopycatError, Result};

/// Terminal outcome of a successful detection stream
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub result: DetectionResult,
    pub processing_time_ms: u64,
    /// Number of `chunk` events seen before `done`
    pub chunks: usize,
}

/// Incremental reader over raw SSE bytes
#[derive(Debug, Default)]
pub struct DetectionStreamReader {
    decoder: SseDecoder,
    chunks: usize,
    finished: bool,
}

impl DetectionStreamReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read.
    ///
    /// Returns `Ok(Some(_))` once a `done` event arrives and `Err` for an
    /// `error` event. Bytes after a terminal event are ignored. Lines that do
    /// not decode as a [`StreamEvent`] are skipped.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Option<DetectionOutcome>> {
        self.push_with(bytes, |_| {})
    }

    /// Like [`push`](Self::push), calling `on_chunk` for each `chunk` event
    pub fn push_with<F>(&mut self, bytes: &[u8], mut on_chunk: F) -> Result<Option<DetectionOutcome>>
    where
        F: FnMut(&str),
    {
        if self.finished {
            return Ok(None);
        }

        for frame in self.decoder.push(bytes) {
            let event: StreamEvent = match frame.try_parse() {
                Some(e) => e,
                None => {
                    tracing::debug!(data = %frame.preview(), "Ignoring malformed event line");
                    continue;
                }
            };

            match event {
                StreamEvent::Chunk { content } => {
                    self.chunks += 1;
                    on_chunk(&content);
                }
                StreamEvent::Done {
                    result,
                    processing_time,
                    ..
                } => {
                    self.finish();
                    return Ok(Some(DetectionOutcome {
                        result,
                        processing_time_ms: processing_time,
                        chunks: self.chunks,
                    }));
                }
                StreamEvent::Error { error } => {
                    self.finish();
                    return Err(CopycatError::Stream(error));
                }
            }
        }

        Ok(None)
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.decoder.clear();
    }
}

/// Drive a byte stream to completion, reporting each chunk's text.
///
/// Fails if the stream carries an `error` event, breaks at the transport
/// level, or ends without any terminal event.
pub async fn read_detection_stream_with<S, B, E, F>(stream: S, mut on_chunk: F) -> Result<DetectionOutcome>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut reader = DetectionStreamReader::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CopycatError::Stream(e.to_string()))?;
        if let Some(outcome) = reader.push_with(chunk.as_ref(), &mut on_chunk)? {
            return Ok(outcome);
        }
    }

    Err(CopycatError::Stream("stream ended without a result".into()))
}

/// [`read_detection_stream_with`] without a chunk callback
pub async fn read_detection_stream<S, B, E>(stream: S) -> Result<DetectionOutcome>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    read_detection_stream_with(stream, |_| {}).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DONE: &str = r#"data: {"type":"done","success":true,"searchMode":"open","result":{"results":[]},"processingTime":42}"#;

    #[test]
    fn test_event_split_across_reads() {
        let mut reader = DetectionStreamReader::new();
        let mut seen = Vec::new();

        let first = reader
            .push_with(b"data: {\"type\":\"chu", |c| seen.push(c.to_string()))
            .unwrap();
        assert!(first.is_none());
        assert!(seen.is_empty());

        let second = reader
            .push_with(b"nk\",\"content\":\"Hi\"}\n\n", |c| seen.push(c.to_string()))
            .unwrap();
        assert!(second.is_none());
        assert_eq!(seen, vec!["Hi"]);
        assert_eq!(reader.chunks(), 1);
    }

    #[test]
    fn test_truncated_line_ignored_then_next_event_processed() {
        let mut reader = DetectionStreamReader::new();
        let mut seen = Vec::new();

        let body = "data: {\"type\":\"chu\ndata: {\"type\":\"chunk\",\"content\":\"ok\"}\n\n";
        let outcome = reader.push_with(body.as_bytes(), |c| seen.push(c.to_string())).unwrap();

        assert!(outcome.is_none());
        assert_eq!(seen, vec!["ok"]);
        assert_eq!(reader.chunks(), 1);
    }

    #[test]
    fn test_done_resolves_outcome() {
        let mut reader = DetectionStreamReader::new();
        let body = format!("data: {{\"type\":\"chunk\",\"content\":\"x\"}}\n\n{}\n\n", DONE);

        let outcome = reader.push(body.as_bytes()).unwrap().unwrap();
        assert_eq!(outcome.result, DetectionResult::Parsed(json!({"results": []})));
        assert_eq!(outcome.processing_time_ms, 42);
        assert_eq!(outcome.chunks, 1);
        assert!(reader.is_finished());

        // Anything after the terminal event is ignored
        assert!(reader.push(b"data: {\"type\":\"error\",\"error\":\"late\"}\n\n").unwrap().is_none());
    }

    #[test]
    fn test_error_event_rejects() {
        let mut reader = DetectionStreamReader::new();
        let err = reader
            .push(b"data: {\"type\":\"error\",\"error\":\"OpenRouter API error 429\"}\n\n")
            .unwrap_err();
        assert!(matches!(err, CopycatError::Stream(msg) if msg == "OpenRouter API error 429"));
    }

    #[test]
    fn test_malformed_lines_ignored() {
        let mut reader = DetectionStreamReader::new();
        let body = format!("data: {{broken\n\ndata: {{\"type\":\"mystery\"}}\n\n: keepalive\n\n{}\n\n", DONE);
        let outcome = reader.push(body.as_bytes()).unwrap();
        assert!(outcome.is_some());
    }

    #[tokio::test]
    async fn test_read_stream_to_outcome() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"type\":\"chunk\",\"content\":\"He".to_vec()),
            Ok(b"llo\"}\n\ndata: {\"type\":\"chunk\",\"content\":\" world\"}\n\n".to_vec()),
            Ok(format!("{}\n\n", DONE).into_bytes()),
        ];

        let mut text = String::new();
        let outcome = read_detection_stream_with(futures::stream::iter(parts), |c| text.push_str(c))
            .await
            .unwrap();
        assert_eq!(text, "Hello world");
        assert_eq!(outcome.chunks, 2);
    }

    #[tokio::test]
    async fn test_stream_without_terminal_event_fails() {
        let parts: Vec<std::result::Result<&[u8], String>> =
            vec![Ok(b"data: {\"type\":\"chunk\",\"content\":\"a\"}\n\n".as_slice())];
        let err = read_detection_stream(futures::stream::iter(parts)).await.unwrap_err();
        assert_eq!(err.to_user_string(), "stream ended without a result");
    }
}
