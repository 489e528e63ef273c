//! Extracted-field payloads.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::{ExtractedDocument, ExtractedField, FieldValue, Finding};

use super::{findings_from_value, locate, scalar_text, JsonParseError};

/// Keys that hold metadata rather than fields in a flat object.
const RESERVED_KEYS: &[&str] = &["fields", "page_text", "findings"];

fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Empty,
        Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Empty),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        Value::Array(items) => FieldValue::List(items.iter().map(extracted_field).collect()),
        Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

fn page_of(obj: &Map<String, Value>) -> Option<usize> {
    obj.get("page")
        .and_then(|p| p.as_u64())
        .and_then(|p| usize::try_from(p).ok())
}

/// A field either as `{"value": ..., "page": n}` or as a bare value.
fn extracted_field(value: &Value) -> ExtractedField {
    match value {
        Value::Object(obj) if obj.contains_key("value") => ExtractedField::new(
            obj.get("value").map(field_value).unwrap_or(FieldValue::Empty),
            page_of(obj),
        ),
        other => ExtractedField::new(field_value(other), None),
    }
}

fn fields_from_object(obj: &Map<String, Value>) -> BTreeMap<String, ExtractedField> {
    obj.iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), extracted_field(v)))
        .collect()
}

/// `[{"name": ..., "value": ..., "page": n}]`
fn fields_from_entries(items: &[Value]) -> BTreeMap<String, ExtractedField> {
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let name = obj.get("name").and_then(scalar_text)?;
            Some((name, extracted_field(item)))
        })
        .collect()
}

fn page_text(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("page_text")
        .and_then(|v| v.as_array())
        .map(|pages| {
            pages
                .iter()
                .map(|p| p.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn document_from_value(value: &Value, raw: &str) -> Result<ExtractedDocument, JsonParseError> {
    match value {
        Value::Object(obj) => {
            let fields = match obj.get("fields") {
                Some(Value::Object(inner)) => fields_from_object(inner),
                Some(Value::Array(items)) => fields_from_entries(items),
                _ => fields_from_object(obj),
            };
            Ok(ExtractedDocument::new(fields, page_text(obj)))
        }
        Value::Array(items) => Ok(ExtractedDocument::new(fields_from_entries(items), Vec::new())),
        other => Err(JsonParseError::new(
            "expected a JSON object of extracted fields",
            &other.to_string(),
            raw,
        )),
    }
}

/// Parse a field extraction.
///
/// Accepts `{"fields": {...}, "page_text": [...]}`, a flat object of fields,
/// or an array of `{name, value, page}` entries.
pub fn parse_fields(raw: &str) -> Result<ExtractedDocument, JsonParseError> {
    let value = locate::locate_value(raw)?;
    document_from_value(&value, raw)
}

/// Findings and form fields from the disclosure form check.
#[derive(Debug, Clone, Default)]
pub struct FormCheckExtraction {
    pub findings: Vec<Finding>,
    pub fields: ExtractedDocument,
}

/// Parse `{"findings": [...], "fields": {...}, "page_text": [...]}`.
///
/// A bare findings array is accepted too and yields no fields.
pub fn parse_form_check(raw: &str) -> Result<FormCheckExtraction, JsonParseError> {
    let value = locate::locate_value(raw)?;
    match &value {
        Value::Array(_) => Ok(FormCheckExtraction {
            findings: findings_from_value(&value, raw)?,
            fields: ExtractedDocument::default(),
        }),
        Value::Object(obj) => {
            let findings = match obj.get("findings") {
                Some(v) => findings_from_value(v, raw)?,
                None => Vec::new(),
            };
            let fields = match obj.get("fields") {
                Some(Value::Object(inner)) => fields_from_object(inner),
                Some(Value::Array(items)) => fields_from_entries(items),
                _ => BTreeMap::new(),
            };
            Ok(FormCheckExtraction {
                findings,
                fields: ExtractedDocument::new(fields, page_text(obj)),
            })
        }
        other => Err(JsonParseError::new(
            "expected a form check object",
            &other.to_string(),
            raw,
        )),
    }
}

/// Both sides of a cross-check extraction plus the model's own findings.
#[derive(Debug, Clone, Default)]
pub struct CrossCheckExtraction {
    pub findings: Vec<Finding>,
    pub evidence: ExtractedDocument,
    pub disclosure: ExtractedDocument,
}

/// Parse `{"findings": [...], "evidence": {...}, "disclosure": {...}}`.
///
/// Both sides are required; `findings` may be absent.
pub fn parse_cross_check(raw: &str) -> Result<CrossCheckExtraction, JsonParseError> {
    let value = locate::locate_value(raw)?;
    let Some(obj) = value.as_object() else {
        return Err(JsonParseError::new(
            "expected a JSON object with evidence and disclosure fields",
            &value.to_string(),
            raw,
        ));
    };

    let side = |key: &str| -> Result<ExtractedDocument, JsonParseError> {
        match obj.get(key) {
            Some(v) => document_from_value(v, raw),
            None => Err(JsonParseError::new(
                format!("missing \"{key}\" in cross-check response"),
                &value.to_string(),
                raw,
            )),
        }
    };

    let findings = match obj.get("findings") {
        Some(v) => findings_from_value(v, raw)?,
        None => Vec::new(),
    };

    Ok(CrossCheckExtraction {
        findings,
        evidence: side("evidence")?,
        disclosure: side("disclosure")?,
    })
}
