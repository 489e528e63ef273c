//! Document types, rendered pages and extracted field data.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of document being verified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Sales contract (売買契約書)
    Contract,
    /// Disclosure statement (重要事項説明書)
    Disclosure,
    /// Equipment list (設備表)
    Equipment,
    /// Run every applicable check
    #[default]
    Auto,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Contract => "contract",
            DocumentType::Disclosure => "disclosure",
            DocumentType::Equipment => "equipment",
            DocumentType::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contract" => Some(DocumentType::Contract),
            "disclosure" => Some(DocumentType::Disclosure),
            "equipment" => Some(DocumentType::Equipment),
            "auto" => Some(DocumentType::Auto),
            _ => None,
        }
    }

    /// Japanese display name used in prompts and output.
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::Contract => "売買契約書",
            DocumentType::Disclosure => "重要事項説明書",
            DocumentType::Equipment => "設備表",
            DocumentType::Auto => "不動産取引書類",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One rendered page ready to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Zero-based page number within its source PDF.
    pub page: usize,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// MIME type of `data` (image/jpeg or image/png).
    pub mime_type: String,
}

impl PageImage {
    pub fn jpeg(page: usize, data: Vec<u8>) -> Self {
        Self {
            page,
            data,
            mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn png(page: usize, data: Vec<u8>) -> Self {
        Self {
            page,
            data,
            mime_type: "image/png".to_string(),
        }
    }
}

/// A value read off the page by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Number(f64),
    Text(String),
    List(Vec<ExtractedField>),
}

impl FieldValue {
    /// Text form of a scalar value. Lists and empty values have none.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            FieldValue::Empty | FieldValue::List(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Number(_) => false,
        }
    }
}

/// Render a number without a trailing `.0` for integral values.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A field value plus the page it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl ExtractedField {
    pub fn new(value: FieldValue, page: Option<usize>) -> Self {
        Self { value, page }
    }

    pub fn text(value: impl Into<String>, page: Option<usize>) -> Self {
        Self::new(FieldValue::Text(value.into()), page)
    }
}

/// Structured result of one extraction pass.
///
/// Built once by the parser and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    fields: BTreeMap<String, ExtractedField>,
    /// Transcribed text per page, when the model provided it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    page_text: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(fields: BTreeMap<String, ExtractedField>, page_text: Vec<String>) -> Self {
        Self { fields, page_text }
    }

    pub fn get(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.get(name)
    }

    /// Scalar text of a field, if present.
    pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.fields.get(name).and_then(|f| f.value.as_text())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ExtractedField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn page_text(&self) -> &[String] {
        &self.page_text
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.page_text.is_empty()
    }
}

impl FromIterator<(String, ExtractedField)> for ExtractedDocument {
    fn from_iter<I: IntoIterator<Item = (String, ExtractedField)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
            page_text: Vec::new(),
        }
    }
}
