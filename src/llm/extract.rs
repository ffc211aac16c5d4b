// src/llm/extract.rs
// Pulls generated text or a detection verdict out of an upstream payload.
//
// Model output is free-form; we assume the prompt is followed but do not
// rely on it. Anything we cannot read becomes MalformedUpstreamOutput.

use super::provider::UpstreamPayload;
use crate::error::{ApiError, ApiResult};
use crate::models::{Confidence, DetectionResult};
use serde::Deserialize;

/// Generated text if the payload carries any (`output`, then `text`).
pub fn generated_text(payload: &UpstreamPayload) -> Option<&str> {
    payload.output.as_deref().or(payload.text.as_deref())
}

/// Generated text, or the serialized payload when there is none.
pub fn extract_text(payload: &UpstreamPayload) -> String {
    match generated_text(payload) {
        Some(text) => text.to_string(),
        None => payload.raw.to_string(),
    }
}

#[derive(Deserialize)]
struct RawVerdict {
    ai_probability: f64,
    confidence: String,
    reasoning: String,
}

/// Parse the first balanced JSON object in the payload text as a verdict.
pub fn extract_structured(payload: &UpstreamPayload) -> ApiResult<DetectionResult> {
    let text = extract_text(payload);
    let candidate = find_json_object(&text)
        .ok_or_else(|| ApiError::MalformedUpstreamOutput("no JSON object found".into()))?;

    let verdict: RawVerdict = serde_json::from_str(candidate)
        .map_err(|e| ApiError::MalformedUpstreamOutput(e.to_string()))?;

    if !verdict.ai_probability.is_finite() || !(0.0..=100.0).contains(&verdict.ai_probability) {
        return Err(ApiError::MalformedUpstreamOutput(format!(
            "ai_probability out of range: {}",
            verdict.ai_probability
        )));
    }
    let confidence = Confidence::from_label(&verdict.confidence).ok_or_else(|| {
        ApiError::MalformedUpstreamOutput(format!("unknown confidence: {}", verdict.confidence))
    })?;

    Ok(DetectionResult {
        ai_probability: verdict.ai_probability.round() as u8,
        confidence,
        reasoning: verdict.reasoning,
    })
}

/// Opening braces tried as object starts before giving up.
const MAX_CANDIDATE_STARTS: usize = 64;

/// First `{...}` substring whose braces balance, ignoring braces inside
/// string literals. Later candidates are tried if an opening brace never
/// closes, up to `MAX_CANDIDATE_STARTS` of them; scans stop at the last `}`.
pub fn find_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let last_close = text.rfind('}')?;
    let mut search_from = 0;

    for _ in 0..MAX_CANDIDATE_STARTS {
        let start = search_from + text[search_from..last_close].find('{')?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes[..=last_close].iter().enumerate().skip(start) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=i]);
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
    }
    None
}
