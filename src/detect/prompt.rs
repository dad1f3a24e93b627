//! Prompt assembly for open copycat search

use super::types::DetectionRequest;

/// Instructions for searching all of X, with hard limits on search depth
/// and a strict JSON output contract.
pub const OPEN_SEARCH_PROMPT: &str = r#"You are a Twitter/X plagiarism detective. Find anyone who copied the original tweet.
**SPEED IS CRITICAL. DO NOT PAGINATE DEEPLY.**

**YOUR TASK:**
1. If a tweet URL is given, look it up and extract its content and posting date.
2. Search X for distinctive phrases from the original text.
3. **STOP** once you have 5 strong matches or 10 seconds have passed.
4. Return only the most relevant exact or near-exact copies.

**SEARCH GUARDRAILS:**
- **MAX RESULTS:** Return at most 5 copycats.
- **DEPTH:** Never look past the first page of search results.
- **FILTER:** Only consider tweets posted AFTER the original date.
- **IGNORE:** Retweets, replies, and quote tweets. Find standalone posts.

**OUTPUT FORMAT (JSON ONLY):**
Respond with ONLY valid JSON:
{
  "originalTweetInfo": {
    "content": "Original content",
    "date": "YYYY-MM-DD",
    "url": "url"
  },
  "searchMode": "open",
  "results": [
    {
      "suspect": "@username",
      "isCopycat": true,
      "confidence": "high/medium/low",
      "matchedTweet": {
        "content": "Copied content",
        "url": "https://twitter.com/...",
        "date": "YYYY-MM-DD",
        "similarity": "95%"
      },
      "explanation": "Brief reasoning"
    }
  ],
  "summary": "Found X accounts that appear to have copied this tweet"
}

If nobody on X copied the tweet, return an empty results array with the summary "No copycats found"."#;

const CLOSING_INSTRUCTION: &str = "Now search across ALL of X for anyone who may have copied this tweet. \
Find up to 10 potential copycats. Remember: output ONLY valid JSON.";

pub const URL_LABEL: &str = "ORIGINAL TWEET URL:";
pub const CONTENT_LABEL: &str = "ORIGINAL TWEET CONTENT:";
pub const DATE_LABEL: &str = "ORIGINAL TWEET DATE:";

/// Build the full instruction string for a detection request.
///
/// Only the fields present on the request get a labeled line.
pub fn build_detection_prompt(request: &DetectionRequest) -> String {
    let mut prompt = String::with_capacity(OPEN_SEARCH_PROMPT.len() + 512);
    prompt.push_str(OPEN_SEARCH_PROMPT);
    prompt.push_str("\n\n---\n");

    if let Some(url) = request.original_url() {
        prompt.push_str(&format!("**{}** {}\n", URL_LABEL, url));
        prompt.push_str("Search X for this tweet and extract its content and date.\n\n");
    }

    if let Some(text) = request.original_text() {
        prompt.push_str(&format!("**{}**\n{}\n\n", CONTENT_LABEL, text));
    }

    if let Some(date) = request.original_date() {
        prompt.push_str(&format!("**{}** {}\n\n", DATE_LABEL, date));
    }

    prompt.push_str("---\n\n");
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}
