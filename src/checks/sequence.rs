//! Sequence validator for numbered equipment lists.

use std::collections::BTreeMap;

use crate::models::{categories, Finding, Location};

use super::normalize::{normalize_digits, parse_numeral};

/// One numbered entry as it appears in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceItem {
    /// The number as written, e.g. `(3)` or `３．`.
    pub label: String,
    pub page: Option<usize>,
}

impl SequenceItem {
    pub fn new(label: impl Into<String>, page: Option<usize>) -> Self {
        Self {
            label: label.into(),
            page,
        }
    }
}

/// Read the integer out of an item label such as `(3)`, `3.`, `No.3` or `第三`.
pub fn parse_item_number(label: &str) -> Option<u64> {
    let normalized = normalize_digits(label);
    let core = normalized
        .trim_start_matches("No.")
        .trim_start_matches("no.")
        .trim_start_matches('第')
        .trim_matches(['(', ')', '.', '、', '番', '号']);
    parse_numeral(core)
}

fn describe_position(index: usize, page: Option<usize>) -> String {
    match page {
        Some(page) => format!("entry {} (page {})", index + 1, page + 1),
        None => format!("entry {}", index + 1),
    }
}

/// Detect gaps and duplicates in an ordered list of item numbers.
///
/// Emits one warning listing every number missing between the smallest and
/// largest value, and one error per duplicated value naming every entry that
/// carries it. Labels that are not numbers are errors of their own.
pub fn check_sequence(field: &str, items: &[SequenceItem]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut positions: BTreeMap<u64, Vec<usize>> = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        match parse_item_number(&item.label) {
            Some(n) => positions.entry(n).or_default().push(index),
            None => findings.push(
                Finding::error(
                    categories::UNPARSEABLE_VALUE,
                    format!(
                        "{field}: \"{}\" at {} is not an item number",
                        item.label,
                        describe_position(index, item.page)
                    ),
                )
                .with_location(item.page.map(Location::page))
                .with_field(field),
            ),
        }
    }

    let values: Vec<u64> = positions.keys().copied().collect();
    let mut missing = Vec::new();
    let mut first_page = None;
    for pair in values.windows(2) {
        let (low, high) = (pair[0], pair[1]);
        if high - low <= 1 {
            continue;
        }
        missing.push(if high - low == 2 {
            format!("{}", low + 1)
        } else {
            format!("{}-{}", low + 1, high - 1)
        });
        if first_page.is_none() {
            first_page = positions
                .get(&high)
                .and_then(|idx| idx.first())
                .and_then(|&i| items[i].page);
        }
    }
    if !missing.is_empty() {
        let missing = missing.join(", ");
        let (first, last) = (values[0], values[values.len() - 1]);
        findings.push(
            Finding::warning(
                categories::SEQUENCE_GAP,
                format!("{field}: numbering {first}-{last} is missing {missing}"),
            )
            .with_location(first_page.map(Location::page))
            .with_field(field)
            .with_values(missing, format!("{first} → {last}")),
        );
    }

    for (value, indices) in &positions {
        if indices.len() < 2 {
            continue;
        }
        let where_ = indices
            .iter()
            .map(|&i| describe_position(i, items[i].page))
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(
            Finding::error(
                categories::SEQUENCE_DUPLICATE,
                format!(
                    "{field}: number {value} appears {} times ({where_})",
                    indices.len()
                ),
            )
            .with_location(items[indices[0]].page.map(Location::page))
            .with_field(field),
        );
    }

    findings
}
