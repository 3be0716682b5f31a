//! Locate and parse the structured payload inside free-form model output.

use crate::error::{PipelineError, Stage};
use serde::de::DeserializeOwned;

/// Greedy span from the first `{` to the last `}`; prose around it is ignored.
pub fn find_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the JSON span of `raw` into `T`. Missing or invalid spans are malformed responses
/// carrying the full raw text.
pub fn parse_json_payload<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<T, PipelineError> {
    let span = find_json_span(raw)
        .ok_or_else(|| PipelineError::malformed(stage, "no JSON object found", raw))?;
    serde_json::from_str(span)
        .map_err(|e| PipelineError::malformed(stage, format!("invalid JSON: {}", e), raw))
}
