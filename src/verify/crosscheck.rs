//! Field-by-field comparison of disclosure values against evidence.

use std::collections::BTreeMap;

use crate::checks::normalize::{fold_numerals, normalize_digits, parse_amount};
use crate::models::{categories, ExtractedDocument, Finding, Location};

/// Unit suffixes ignored when comparing measurements.
const UNIT_SUFFIXES: &[&str] = &["㎡", "m²", "m2", "平方メートル", "%", "％", "円"];

/// How two written values relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    /// Same value written differently (kanji vs digits).
    NotationOnly,
    Different,
}

/// Fold full-width ASCII to half-width and drop whitespace and separators.
fn fold_width(s: &str) -> String {
    normalize_digits(s)
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn measure(folded: &str) -> Option<f64> {
    let number = UNIT_SUFFIXES
        .iter()
        .find_map(|unit| folded.strip_suffix(*unit))
        .unwrap_or(folded);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    number.parse().ok()
}

/// Compare after width folding, then numerically, then modulo numeral notation.
pub fn compare_values(expected: &str, actual: &str) -> Comparison {
    let a = fold_width(expected);
    let b = fold_width(actual);
    if a == b {
        return Comparison::Equal;
    }

    if let (Some(x), Some(y)) = (measure(&a), measure(&b)) {
        return if (x - y).abs() < 1e-9 {
            Comparison::Equal
        } else {
            Comparison::Different
        };
    }
    if let (Some(x), Some(y)) = (parse_amount(&a), parse_amount(&b)) {
        return if x == y {
            Comparison::NotationOnly
        } else {
            Comparison::Different
        };
    }

    if fold_numerals(&a) == fold_numerals(&b) {
        Comparison::NotationOnly
    } else {
        Comparison::Different
    }
}

/// Diff every field the evidence carries against the disclosure.
///
/// Page numbers are already indices into the combined image list.
pub fn diff_fields(evidence: &ExtractedDocument, disclosure: &ExtractedDocument) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (name, ev_field) in evidence.fields() {
        let Some(expected) = ev_field.value.as_text().filter(|s| !s.trim().is_empty()) else {
            continue;
        };

        let Some(ds_field) = disclosure.get(name) else {
            findings.push(
                Finding::warning(
                    categories::BLANK_FIELD,
                    format!("{name}: \"{expected}\" is in the evidence but not in the disclosure"),
                )
                .with_location(ev_field.page.map(Location::page))
                .with_field(name),
            );
            continue;
        };

        let actual = ds_field.value.as_text().unwrap_or_default();
        let location = ds_field.page.or(ev_field.page).map(Location::page);

        match compare_values(&expected, &actual) {
            Comparison::Equal => {}
            Comparison::NotationOnly => findings.push(
                Finding::warning(
                    categories::NOTATION_MISMATCH,
                    format!(
                        "{name}: same value written differently \
                         (evidence \"{expected}\", disclosure \"{actual}\")"
                    ),
                )
                .with_location(location)
                .with_field(name)
                .with_values(&*expected, &*actual),
            ),
            Comparison::Different => findings.push(
                Finding::error(
                    categories::FIELD_MISMATCH,
                    format!(
                        "{name}: disclosure \"{actual}\" does not match evidence \"{expected}\""
                    ),
                )
                .with_location(location)
                .with_field(name)
                .with_values(&*expected, &*actual),
            ),
        }
    }

    findings
}

/// Compare extracted form fields against configured known-correct values.
pub fn check_reference_values(
    fields: &ExtractedDocument,
    reference_values: &BTreeMap<String, String>,
) -> Vec<Finding> {
    reference_values
        .iter()
        .filter_map(|(name, expected)| {
            let field = fields.get(name)?;
            let actual = field.value.as_text()?;
            (compare_values(expected, &actual) == Comparison::Different).then(|| {
                Finding::error(
                    categories::REFERENCE_MISMATCH,
                    format!(
                        "{name}: \"{actual}\" differs from the registered value \"{expected}\""
                    ),
                )
                .with_location(field.page.map(Location::page))
                .with_field(name.clone())
                .with_values(expected.clone(), actual.into_owned())
            })
        })
        .collect()
}
