//! Findings reported by AI review and rule-based checks.

use serde::{Deserialize, Serialize};

/// Category labels emitted by the built-in checks.
pub mod categories {
    pub const GENERAL: &str = "general";
    pub const AMOUNT_MISMATCH: &str = "amount-mismatch";
    pub const AMOUNT_FORMAT: &str = "amount-format";
    pub const UNPARSEABLE_VALUE: &str = "unparseable-value";
    pub const DATE_INVALID: &str = "date-invalid";
    pub const DATE_SUSPICIOUS: &str = "date-suspicious";
    pub const BLANK_FIELD: &str = "blank-field";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const SEQUENCE_GAP: &str = "sequence-gap";
    pub const SEQUENCE_DUPLICATE: &str = "sequence-duplicate";
    pub const FIELD_MISMATCH: &str = "field-mismatch";
    pub const NOTATION_MISMATCH: &str = "notation-mismatch";
    pub const REFERENCE_MISMATCH: &str = "reference-mismatch";
    pub const DOCUMENT_TYPE: &str = "document-type";
    pub const TRANSACTION_MODE: &str = "transaction-mode";
    pub const FORM_CHECK: &str = "form-check";
    pub const SAFETY_BLOCK: &str = "safety-block";
    pub const PARSE_FAILED: &str = "parse-failed";
    pub const EXTRACTION_FAILED: &str = "extraction-failed";
}

/// How serious a finding is.
///
/// Variant order is display order: errors first, then warnings, then info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Wrong or missing value that must be fixed.
    Error,
    /// Suspicious value that needs a human look.
    Warning,
    /// Advice or reference information.
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "info" | "suggestion" | "advice" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Parse a severity coming from model output; anything unrecognised is a warning.
    pub fn from_model_output(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rectangle on a page in coordinates normalised to 0-1000 on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Build from `[x, y, w, h]`.
    pub fn from_xywh(values: [f64; 4]) -> Option<Self> {
        let [x, y, width, height] = values;
        let bbox = Self {
            x,
            y,
            width,
            height,
        };
        bbox.is_valid().then_some(bbox)
    }

    /// Build from the `[ymin, xmin, ymax, xmax]` layout Gemini uses for `box_2d`.
    pub fn from_box_2d(values: [f64; 4]) -> Option<Self> {
        let [ymin, xmin, ymax, xmax] = values;
        Self::from_xywh([xmin, ymin, xmax - xmin, ymax - ymin])
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Where a finding points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Location {
    /// Zero-based index into the image list sent to the model, optionally narrowed to a box.
    Region {
        page: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bbox: Option<BoundingBox>,
    },
    /// Free-form reference such as a field name or section label.
    Label { label: String },
}

impl Location {
    pub fn page(page: usize) -> Self {
        Location::Region { page, bbox: None }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Location::Label {
            label: label.into(),
        }
    }

    /// Page index, if this location is a page region.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            Location::Region { page, .. } => Some(*page),
            Location::Label { .. } => None,
        }
    }

    /// Shift a page region by `offset` pages.
    pub fn offset_pages(self, offset: usize) -> Self {
        match self {
            Location::Region { page, bbox } => Location::Region {
                page: page + offset,
                bbox,
            },
            other => other,
        }
    }
}

/// One detected issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            location: None,
            field_name: None,
            expected: None,
            actual: None,
        }
    }

    pub fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn info(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn with_field(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Attach the two sides of a value mismatch.
    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}
