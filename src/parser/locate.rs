//! Locating JSON inside free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::JsonParseError;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").unwrap());

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[\]}])").unwrap());

/// Attempts at cutting a truncated array back to a complete element.
const MAX_RESCUE_ATTEMPTS: usize = 64;

/// Body of the first fenced block, or the whole text when there is none.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
}

pub(crate) fn remove_trailing_commas(s: &str) -> String {
    TRAILING_COMMA.replace_all(s, "$1").into_owned()
}

fn decode(fragment: &str, raw: &str) -> Result<Value, JsonParseError> {
    serde_json::from_str(&remove_trailing_commas(fragment))
        .map_err(|e| JsonParseError::new(format!("invalid JSON: {e}"), fragment, raw))
}

/// Cut an unterminated array back to its last complete element and close it.
fn rescue_truncated(fragment: &str) -> Option<Value> {
    let mut end = fragment.len();
    for _ in 0..MAX_RESCUE_ATTEMPTS {
        let close = fragment[..end].rfind('}')?;
        let candidate = format!("{}]", &fragment[..=close]);
        if let Ok(value) = serde_json::from_str::<Value>(&remove_trailing_commas(&candidate)) {
            return Some(value);
        }
        end = close;
    }
    None
}

/// Find and decode the JSON array in a response.
///
/// Uses a fenced block when present, then the span from the first `[` to
/// the last `]`. An array cut off mid-element is closed after its last
/// complete element.
pub(crate) fn locate_array(raw: &str) -> Result<Value, JsonParseError> {
    let body = strip_code_fence(raw);
    let start = body
        .find('[')
        .ok_or_else(|| JsonParseError::new("no JSON array found in response", body, raw))?;
    let tail = &body[start..];

    if let Some(end) = tail.rfind(']') {
        match decode(&tail[..=end], raw) {
            Ok(value) => return Ok(value),
            Err(err) if tail.trim_end().ends_with(']') => return Err(err),
            Err(_) => {}
        }
    }

    match rescue_truncated(tail) {
        Some(value) => {
            warn!("Model response was truncated; recovered the complete elements");
            Ok(value)
        }
        None => Err(JsonParseError::new(
            "JSON array is unterminated and no complete element could be recovered",
            tail,
            raw,
        )),
    }
}

/// Find and decode the JSON object (or array) in a response.
pub(crate) fn locate_value(raw: &str) -> Result<Value, JsonParseError> {
    let body = strip_code_fence(raw);
    let start = body
        .find(['{', '['])
        .ok_or_else(|| JsonParseError::new("no JSON found in response", body, raw))?;

    if body[start..].starts_with('[') {
        return locate_array(raw);
    }

    let tail = &body[start..];
    let end = tail
        .rfind('}')
        .ok_or_else(|| JsonParseError::new("JSON object is unterminated", tail, raw))?;
    decode(&tail[..=end], raw)
}
