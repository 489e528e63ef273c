//! Amount validator: figures vs written form.

use crate::models::{categories, ExtractedDocument, Finding, Location};

use super::normalize::{format_yen, parse_amount};

/// Suffix of a field carrying the written form of an amount.
pub const WRITTEN_SUFFIX: &str = "_written";

/// Suffix identifying an amount field.
pub const AMOUNT_SUFFIX: &str = "_amount";

/// Compare the figures of an amount against its written form.
///
/// Returns `None` when both parse to the same value. A side that does not
/// parse at all is its own "unparseable value" error.
pub fn check_amount_pair(
    field: &str,
    figures: &str,
    written: &str,
    location: Option<Location>,
) -> Option<Finding> {
    let Some(digits_value) = parse_amount(figures) else {
        return Some(unparseable(field, figures, location));
    };
    let written_field = format!("{field}{WRITTEN_SUFFIX}");
    let Some(written_value) = parse_amount(written) else {
        return Some(unparseable(&written_field, written, location));
    };

    (digits_value != written_value).then(|| {
        Finding::error(
            categories::AMOUNT_MISMATCH,
            format!(
                "{field}: amount in figures ({}円) does not match the written amount ({}円)",
                format_yen(digits_value),
                format_yen(written_value)
            ),
        )
        .with_location(location)
        .with_field(field)
        .with_values(figures, written)
    })
}

fn unparseable(field: &str, raw: &str, location: Option<Location>) -> Finding {
    Finding::error(
        categories::UNPARSEABLE_VALUE,
        format!("{field}: \"{raw}\" is not a readable amount"),
    )
    .with_location(location)
    .with_field(field)
}

/// Check every `*_amount` field, pairing it with `*_amount_written` when present.
pub fn check_amounts(doc: &ExtractedDocument) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (name, field) in doc.fields() {
        if !name.ends_with(AMOUNT_SUFFIX) || field.value.is_empty() {
            continue;
        }
        let Some(figures) = field.value.as_text() else {
            continue;
        };
        let location = field.page.map(Location::page);

        let written = doc
            .get(&format!("{name}{WRITTEN_SUFFIX}"))
            .filter(|w| !w.value.is_empty())
            .and_then(|w| w.value.as_text());

        match written {
            Some(written) => {
                findings.extend(check_amount_pair(name, &figures, &written, location));
            }
            None if parse_amount(&figures).is_none() => {
                findings.push(unparseable(name, &figures, location));
            }
            None => {}
        }
    }

    findings
}
