//! Result parser: model output to typed findings and fields.
//!
//! The model is asked for JSON but answers in free text, sometimes wrapped in
//! prose or code fences, sometimes cut off. Everything downstream sees only
//! the typed values produced here.

mod fields;
mod locate;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{categories, format_number, BoundingBox, Finding, Location, Severity};

pub use fields::{
    parse_cross_check, parse_fields, parse_form_check, CrossCheckExtraction, FormCheckExtraction,
};

/// Characters of the offending fragment kept in the error message.
const FRAGMENT_PREVIEW_CHARS: usize = 200;

/// The response held no decodable JSON where one was expected.
///
/// Never used for "no findings": an empty array parses to an empty list.
#[derive(Debug, Clone, Error)]
#[error("{message} (near: {})", preview(.fragment))]
pub struct JsonParseError {
    pub message: String,
    /// The substring that failed to decode.
    pub fragment: String,
    /// The full response, for diagnostics.
    pub raw_response: String,
}

impl JsonParseError {
    pub fn new(message: impl Into<String>, fragment: &str, raw_response: &str) -> Self {
        Self {
            message: message.into(),
            fragment: fragment.to_string(),
            raw_response: raw_response.to_string(),
        }
    }
}

fn preview(s: &str) -> String {
    let mut out: String = s.chars().take(FRAGMENT_PREVIEW_CHARS).collect();
    if out.len() < s.len() {
        out.push('…');
    }
    out
}

/// Parse a findings array.
///
/// Elements missing `severity` or `message` are skipped with a warning; the
/// rest keep their order.
pub fn parse_findings(raw: &str) -> Result<Vec<Finding>, JsonParseError> {
    let value = locate::locate_array(raw)?;
    findings_from_value(&value, raw)
}

pub(crate) fn findings_from_value(
    value: &Value,
    raw: &str,
) -> Result<Vec<Finding>, JsonParseError> {
    let Value::Array(elements) = value else {
        return Err(JsonParseError::new(
            "expected a JSON array of findings",
            &value.to_string(),
            raw,
        ));
    };

    let mut findings = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match finding_from_element(element) {
            Some(finding) => findings.push(finding),
            None => warn!(
                "Skipping finding #{}: missing severity or message: {}",
                index,
                preview(&element.to_string())
            ),
        }
    }
    Ok(findings)
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Scalar JSON as text; null, empty strings and containers give `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn finding_from_element(element: &Value) -> Option<Finding> {
    let obj = element.as_object()?;
    let severity = first_of(obj, &["severity", "status"]).and_then(scalar_text)?;
    let message = first_of(obj, &["message"]).and_then(scalar_text)?;

    let category = first_of(obj, &["category"])
        .and_then(scalar_text)
        .unwrap_or_else(|| categories::GENERAL.to_string());

    let mut finding = Finding::new(Severity::from_model_output(&severity), category, message)
        .with_location(location_from_element(obj));
    finding.field_name = first_of(obj, &["field_name", "item", "field"]).and_then(scalar_text);
    finding.expected = first_of(obj, &["expected", "evidence"]).and_then(scalar_text);
    finding.actual = first_of(obj, &["actual", "target"]).and_then(scalar_text);
    Some(finding)
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Four numbers from an array, or from a string holding one.
fn four_numbers(value: &Value) -> Option<[f64; 4]> {
    let parsed;
    let value = match value {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s.trim()).ok()?;
            &parsed
        }
        other => other,
    };
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn location_from_element(obj: &Map<String, Value>) -> Option<Location> {
    match obj.get("location") {
        Some(Value::String(label)) if !label.trim().is_empty() => {
            return Some(Location::label(label.trim()));
        }
        Some(Value::Object(loc)) => {
            let page = loc.get("page").and_then(as_index);
            let bbox = loc
                .get("bbox")
                .and_then(four_numbers)
                .and_then(BoundingBox::from_xywh);
            if let Some(page) = page {
                return Some(Location::Region { page, bbox });
            }
        }
        _ => {}
    }

    // Flat form: box_2d in [ymin, xmin, ymax, xmax] plus image_index
    let page = first_of(obj, &["image_index", "page"]).and_then(as_index);
    let bbox = obj
        .get("box_2d")
        .and_then(four_numbers)
        .and_then(BoundingBox::from_box_2d);
    match (page, bbox) {
        (Some(page), bbox) => Some(Location::Region { page, bbox }),
        (None, Some(bbox)) => Some(Location::Region {
            page: 0,
            bbox: Some(bbox),
        }),
        (None, None) => None,
    }
}
