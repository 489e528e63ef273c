//! Scanners over transcribed page text.
//!
//! These catch what a field extraction can miss: amounts that look short by
//! a digit, leftover blanks, and signs that the wrong kind of document was
//! uploaded.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{categories, Finding, Location};

use super::normalize::normalize_digits;
use super::sequence::SequenceItem;

/// Blank markers that should never survive into a finished document.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "（　）",
    "（  ）",
    "(  )",
    "＿＿＿",
    "___",
    "－－－－－",
    "未記入",
    "未定",
];

/// Headings every disclosure statement carries.
const DISCLOSURE_KEYWORDS: &[&str] = &[
    "重要事項説明書",
    "宅地建物取引業者",
    "宅地建物取引士",
    "登記記録",
    "法令上の制限",
    "供託所",
    "取引態様",
];

/// Words found on equipment lists.
const EQUIPMENT_WORDS: &[&str] = &[
    "設備",
    "付属設備",
    "キッチン",
    "浴室",
    "トイレ",
    "エアコン",
    "給湯",
];

/// Minimum disclosure keywords before a document is accepted as one.
const MIN_DISCLOSURE_KEYWORDS: usize = 3;

// 1-9万円 where the figure is not part of a longer number
static SMALL_MAN_YEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9.,])([1-9])\s*万円").unwrap());

static UNSEPARATED_YEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9０-９]{4,}\s*円").unwrap());

static TRANSACTION_MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"取引態様[ \t　]*[：:][ \t　]*([^\n]*)").unwrap());

static LIST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:\(\s*([0-9]+)\s*\)|([0-9]+)\s*[.)、])").unwrap()
});

fn page_finding(finding: Finding, page: usize) -> Finding {
    finding.with_location(Some(Location::page(page)))
}

/// Amount figures that look wrong: `N万円` with a single digit, or long
/// figures without thousands separators.
pub fn scan_amounts(pages: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (page, text) in pages.iter().enumerate() {
        // Width-fold only; separators must survive for the format check
        let folded: String = text
            .chars()
            .map(|c| match c {
                '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
                '，' => ',',
                _ => c,
            })
            .collect();

        for caps in SMALL_MAN_YEN.captures_iter(&folded) {
            findings.push(page_finding(
                Finding::warning(
                    categories::AMOUNT_FORMAT,
                    format!(
                        "Page {}: \"{}万円\" is unusually small; a digit may be missing",
                        page + 1,
                        &caps[1]
                    ),
                ),
                page,
            ));
        }

        for m in UNSEPARATED_YEN.find_iter(text) {
            findings.push(page_finding(
                Finding::info(
                    categories::AMOUNT_FORMAT,
                    format!(
                        "Page {}: \"{}\" has no thousands separators",
                        page + 1,
                        m.as_str()
                    ),
                ),
                page,
            ));
        }
    }

    findings
}

/// Blank markers left in the text.
pub fn scan_placeholders(pages: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (page, text) in pages.iter().enumerate() {
        for token in PLACEHOLDER_TOKENS {
            if text.contains(token) {
                findings.push(page_finding(
                    Finding::warning(
                        categories::PLACEHOLDER,
                        format!("Page {}: placeholder \"{token}\" left unfilled", page + 1),
                    ),
                    page,
                ));
            }
        }
    }
    findings
}

/// Disclosure-specific checks: keyword coverage and the transaction mode line.
pub fn scan_disclosure(pages: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if pages.is_empty() {
        return findings;
    }

    let found = DISCLOSURE_KEYWORDS
        .iter()
        .filter(|kw| pages.iter().any(|p| p.contains(*kw)))
        .count();
    if found < MIN_DISCLOSURE_KEYWORDS {
        findings.push(Finding::info(
            categories::DOCUMENT_TYPE,
            format!(
                "Only {found} of {} disclosure headings found; \
                 this may not be a disclosure statement",
                DISCLOSURE_KEYWORDS.len()
            ),
        ));
    }

    for (page, text) in pages.iter().enumerate() {
        for caps in TRANSACTION_MODE.captures_iter(text) {
            let value = caps[1].trim();
            if value.chars().count() < 2 {
                findings.push(page_finding(
                    Finding::warning(
                        categories::TRANSACTION_MODE,
                        format!(
                            "Page {}: transaction mode (取引態様) is not filled in",
                            page + 1
                        ),
                    )
                    .with_field("transaction_mode"),
                    page,
                ));
            }
        }
    }

    findings
}

/// Equipment-list checks that do not need the numbering.
pub fn scan_equipment(pages: &[String]) -> Vec<Finding> {
    if pages.is_empty() || pages.iter().any(|p| EQUIPMENT_WORDS.iter().any(|w| p.contains(w))) {
        return Vec::new();
    }
    vec![Finding::info(
        categories::DOCUMENT_TYPE,
        "No equipment terms found; this may not be an equipment list",
    )]
}

/// Numbered list prefixes (`1.`, `1)`, `(1)`, `１．`) in page order.
pub fn list_numbers(pages: &[String]) -> Vec<SequenceItem> {
    let mut items = Vec::new();
    for (page, text) in pages.iter().enumerate() {
        let folded: String = text
            .lines()
            .map(normalize_digits)
            .collect::<Vec<_>>()
            .join("\n");
        for caps in LIST_NUMBER.captures_iter(&folded) {
            if let Some(n) = caps.get(1).or_else(|| caps.get(2)) {
                items.push(SequenceItem::new(n.as_str(), Some(page)));
            }
        }
    }
    items
}
