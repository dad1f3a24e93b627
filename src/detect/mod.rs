//! Copycat detection pipeline
//!
//! prompt -> completion stream -> relay (chunk events + accumulation)
//! -> extraction -> terminal `done` event. The reader consumes the same
//! event stream on the client side.

pub mod extract;
pub mod prompt;
pub mod reader;
pub mod relay;
pub mod types;

pub use extract::{extract_result, strip_code_fences, PARSE_WARNING};
pub use prompt::build_detection_prompt;
pub use reader::{read_detection_stream, read_detection_stream_with, DetectionOutcome, DetectionStreamReader};
pub use relay::relay;
pub use types::{
    Confidence, DetectionPayload, DetectionReport, DetectionRequest, DetectionResult, FallbackResult,
    MatchedTweet, OriginalTweetInfo, StreamEvent, SuspectMatch, SEARCH_MODE_OPEN,
};
