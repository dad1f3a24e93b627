//! Turn accumulated model output into a [`DetectionResult`]

use serde_json::Value;

use super::types::{DetectionResult, FallbackResult};

pub const PARSE_WARNING: &str = "Response was not valid JSON, showing raw output";

/// Strip markdown code fences from a string.
///
/// Handles a leading ```` ```json ```` (any case) or bare ```` ``` ```` and a
/// trailing ```` ``` ````, each independently, then trims.
pub fn strip_code_fences(s: &str) -> &str {
    let mut trimmed = s.trim();

    // Try ```json ... (case-insensitive tag)
    let json_fence = trimmed
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("```json"));
    if json_fence {
        trimmed = &trimmed[7..];
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }

    if let Some(rest) = trimmed.trim_end().strip_suffix("```") {
        trimmed = rest;
    }

    trimmed.trim()
}

/// Build the final result from the full model output.
///
/// Never fails: output that is not valid JSON after fence stripping comes
/// back as a [`FallbackResult`] carrying the cleaned text.
pub fn extract_result(accumulated: &str) -> DetectionResult {
    let cleaned = strip_code_fences(accumulated);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => DetectionResult::Parsed(value),
        Err(e) => {
            tracing::debug!(error = %e, len = cleaned.len(), "Model output is not valid JSON, using raw fallback");
            DetectionResult::Fallback(FallbackResult {
                raw_response: cleaned.to_string(),
                parse_warning: PARSE_WARNING.to_string(),
            })
        }
    }
}
