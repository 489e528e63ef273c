//! Data models shared by the extraction, parsing and checking stages.

mod check_result;
mod document;
mod finding;

pub use check_result::{CheckResult, CheckStatus};
pub(crate) use document::format_number;
pub use document::{DocumentType, ExtractedDocument, ExtractedField, FieldValue, PageImage};
pub use finding::{categories, BoundingBox, Finding, Location, Severity};
