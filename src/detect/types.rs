//! Detection request/response types and the SSE event envelope

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{CopycatError, Result};

/// Search mode reported on every `done` event
pub const SEARCH_MODE_OPEN: &str = "open";

// ============================================================================
// Request Types
// ============================================================================

/// Inbound body for `POST /api/copycat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_tweet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_url: Option<String>,
}

/// A validated detection request.
///
/// At least one of `original_text` / `original_url` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRequest {
    original_text: Option<String>,
    original_url: Option<String>,
    original_date: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DetectionRequest {
    pub const MISSING_INPUT: &'static str = "Either original tweet text or tweet URL is required";

    pub fn new(
        original_text: Option<String>,
        original_url: Option<String>,
        original_date: Option<String>,
    ) -> Result<Self> {
        let original_text = non_blank(original_text);
        let original_url = non_blank(original_url);
        if original_text.is_none() && original_url.is_none() {
            return Err(CopycatError::InvalidInput(Self::MISSING_INPUT.to_string()));
        }
        Ok(Self {
            original_text,
            original_url,
            original_date: non_blank(original_date),
        })
    }

    pub fn original_text(&self) -> Option<&str> {
        self.original_text.as_deref()
    }

    pub fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    pub fn original_date(&self) -> Option<&str> {
        self.original_date.as_deref()
    }
}

impl TryFrom<DetectionPayload> for DetectionRequest {
    type Error = CopycatError;

    fn try_from(payload: DetectionPayload) -> Result<Self> {
        Self::new(payload.original_tweet, payload.tweet_url, payload.original_date)
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Degraded result used when the model output is not valid JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FallbackResult {
    pub raw_response: String,
    pub parse_warning: String,
}

/// Final outcome of a detection, built once from the accumulated model output.
///
/// `Parsed` carries whatever JSON the model produced, unvalidated. Use
/// [`DetectionResult::report`] for a typed, lenient view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionResult {
    Fallback(FallbackResult),
    Parsed(Value),
}

impl DetectionResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DetectionResult::Fallback(_))
    }

    /// Raw text when the model output could not be parsed
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DetectionResult::Fallback(f) => Some(&f.raw_response),
            DetectionResult::Parsed(_) => None,
        }
    }

    /// Typed view of a parsed result. Returns `None` for fallbacks and for
    /// parsed values that are not JSON objects. Individual matches that do
    /// not fit [`SuspectMatch`] are skipped rather than failing the report.
    pub fn report(&self) -> Option<DetectionReport> {
        let DetectionResult::Parsed(Value::Object(map)) = self else {
            return None;
        };

        let field = |name: &str| map.get(name).cloned().unwrap_or(Value::Null);

        let results = match map.get("results") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<SuspectMatch>(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        Some(DetectionReport {
            original_tweet_info: serde_json::from_value(field("originalTweetInfo")).ok(),
            search_mode: field("searchMode").as_str().map(str::to_string),
            results,
            summary: field("summary").as_str().map(str::to_string),
        })
    }
}

/// Typed view of the JSON shape the detection prompt asks for
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub original_tweet_info: Option<OriginalTweetInfo>,
    pub search_mode: Option<String>,
    pub results: Vec<SuspectMatch>,
    pub summary: Option<String>,
}

impl DetectionReport {
    /// Matches the model flagged as copies
    pub fn copycats(&self) -> impl Iterator<Item = &SuspectMatch> {
        self.results.iter().filter(|m| m.is_copycat)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OriginalTweetInfo {
    pub content: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
}

/// One suspected copy. `suspect` is not unique across a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuspectMatch {
    pub suspect: String,
    pub is_copycat: bool,
    pub confidence: Confidence,
    pub matched_tweet: Option<MatchedTweet>,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchedTweet {
    pub content: String,
    pub url: String,
    pub date: String,
    /// Percentage string, e.g. "95%"
    #[serde(deserialize_with = "string_or_number")]
    pub similarity: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => format!("{}%", n),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("medium") => Confidence::Medium,
            Some("low") => Confidence::Low,
            _ => Confidence::Unknown,
        })
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
            Confidence::Unknown => write!(f, "unknown"),
        }
    }
}

// ============================================================================
// SSE Event Types
// ============================================================================

/// Events sent to the caller via SSE.
///
/// Any number of `chunk` events is followed by exactly one `done` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental model output, forwarded as it arrives
    Chunk { content: String },

    /// Final result.
    ///
    /// The model's output is nested under `result` rather than merged into
    /// the event, so a model emitting keys like `type` or `success` cannot
    /// clobber the envelope. Clients built against the older flat shape
    /// must read `event.result.results` instead of `event.results`.
    #[serde(rename_all = "camelCase")]
    Done {
        success: bool,
        search_mode: String,
        result: DetectionResult,
        /// Milliseconds since the request began
        processing_time: u64,
    },

    Error { error: String },
}

impl StreamEvent {
    pub fn chunk(content: impl Into<String>) -> Self {
        StreamEvent::Chunk {
            content: content.into(),
        }
    }

    pub fn done(result: DetectionResult, processing_time: u64) -> Self {
        StreamEvent::Done {
            success: true,
            search_mode: SEARCH_MODE_OPEN.to_string(),
            result,
            processing_time,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk { .. })
    }
}
