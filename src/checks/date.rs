//! Date validator: calendar validity, era consistency and far-future dates.

use chrono::{Months, NaiveDate};

use crate::models::{categories, ExtractedDocument, Finding, Location};

use super::normalize::{find_dates, parse_date, DateParts};
use super::RuleContext;

/// Suffix identifying a date field.
pub const DATE_SUFFIX: &str = "_date";

/// Validate one date field value.
///
/// A value with no recognisable date is an "unparseable value" error.
pub fn check_date_value(
    field: &str,
    raw: &str,
    location: Option<Location>,
    ctx: &RuleContext<'_>,
) -> Vec<Finding> {
    match parse_date(raw) {
        Some(parts) => check_date_parts(field, &parts, location, ctx),
        None => vec![Finding::error(
            categories::UNPARSEABLE_VALUE,
            format!("{field}: \"{raw}\" is not a readable date"),
        )
        .with_location(location)
        .with_field(field)],
    }
}

/// Validate an already-split date.
///
/// Invalid month or day is one error and stops further checks. Era overrun
/// and far-future dates are warnings.
pub fn check_date_parts(
    label: &str,
    parts: &DateParts,
    location: Option<Location>,
    ctx: &RuleContext<'_>,
) -> Vec<Finding> {
    let invalid = |what: String| {
        vec![Finding::error(
            categories::DATE_INVALID,
            format!("{label}: {} is not a valid date ({what})", parts.text),
        )
        .with_location(location.clone())
        .with_field(label)]
    };

    if !(1..=12).contains(&parts.month) {
        return invalid(format!("month {} does not exist", parts.month));
    }
    let Some(date) = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day) else {
        return invalid(format!("day {} does not exist in month {}", parts.day, parts.month));
    };

    let mut findings = Vec::new();

    if let (Some(era), Some(era_year)) = (parts.era, parts.era_year) {
        let ymd = parts.ymd();
        let before_start = era_year == 0 || ymd < era.start();
        let after_end = era.end().is_some_and(|end| ymd > end);
        if before_start || after_end {
            let (y, m, d) = if after_end {
                era.end().unwrap_or(era.start())
            } else {
                era.start()
            };
            let boundary = if after_end { "ended" } else { "began" };
            findings.push(
                Finding::warning(
                    categories::DATE_SUSPICIOUS,
                    format!(
                        "{label}: {} is outside the {} era, which {boundary} on {y}-{m:02}-{d:02}",
                        parts.text,
                        era.name()
                    ),
                )
                .with_location(location.clone())
                .with_field(label),
            );
        }
    }

    let limit = ctx
        .today
        .checked_add_months(Months::new(ctx.future_tolerance_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MAX);
    if date > limit {
        findings.push(
            Finding::warning(
                categories::DATE_SUSPICIOUS,
                format!(
                    "{label}: {} is more than {} years in the future",
                    parts.text, ctx.future_tolerance_years
                ),
            )
            .with_location(location)
            .with_field(label),
        );
    }

    findings
}

/// Check every `*_date` field. When the document has none, dates found in
/// the transcribed page text are checked instead.
pub fn check_dates(doc: &ExtractedDocument, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut saw_date_field = false;

    for (name, field) in doc.fields() {
        if !name.ends_with(DATE_SUFFIX) {
            continue;
        }
        saw_date_field = true;
        if field.value.is_empty() {
            continue;
        }
        if let Some(raw) = field.value.as_text() {
            findings.extend(check_date_value(name, &raw, field.page.map(Location::page), ctx));
        }
    }

    if !saw_date_field {
        for (page, text) in doc.page_text().iter().enumerate() {
            let label = format!("page {} text", page + 1);
            for parts in find_dates(text) {
                findings.extend(check_date_parts(&label, &parts, Some(Location::page(page)), ctx));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, ExtractedField, Severity};

    fn ctx() -> RuleContext<'static> {
        RuleContext {
            document_type: DocumentType::Contract,
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            future_tolerance_years: 10,
            required_fields: &[],
        }
    }

    #[test]
    fn test_valid_date_has_no_findings() {
        assert!(check_date_value("contract_date", "2025年3月1日", None, &ctx()).is_empty());
        assert!(check_date_value("contract_date", "令和7年3月1日", None, &ctx()).is_empty());
    }

    #[test]
    fn test_invalid_month_is_exactly_one_error() {
        let findings = check_date_value("contract_date", "2025年13月1日", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].category, categories::DATE_INVALID);
    }

    #[test]
    fn test_invalid_day_is_error() {
        let findings = check_date_value("contract_date", "2025年2月30日", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_far_future_is_warning() {
        let findings = check_date_value("settlement_date", "2075年6月1日", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].category, categories::DATE_SUSPICIOUS);
    }

    #[test]
    fn test_within_tolerance_is_fine() {
        assert!(check_date_value("settlement_date", "2034年6月1日", None, &ctx()).is_empty());
    }

    #[test]
    fn test_era_overrun_is_warning() {
        // 平成32年 never existed; the era ended in its 31st year
        let findings = check_date_value("contract_date", "平成32年1月1日", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);

        let findings = check_date_value("contract_date", "令和元年4月1日", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_huge_era_year_is_unreadable() {
        for raw in ["令和2147483647年1月1日", "令和4294967295年1月1日"] {
            let findings = check_date_value("contract_date", raw, None, &ctx());
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].severity, Severity::Error);
            assert_eq!(findings[0].category, categories::UNPARSEABLE_VALUE);
        }
    }

    #[test]
    fn test_unreadable_date() {
        let findings = check_date_value("contract_date", "別途協議", None, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, categories::UNPARSEABLE_VALUE);
    }

    #[test]
    fn test_page_text_used_without_date_fields() {
        let doc = ExtractedDocument::new(
            Default::default(),
            vec!["契約日 2025年3月1日".into(), "引渡日 2025年4月31日".into()],
        );
        let findings = check_dates(&doc, &ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, Some(Location::page(1)));
    }

    #[test]
    fn test_page_text_ignored_with_date_fields() {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert(
            "contract_date".to_string(),
            ExtractedField::text("2025年3月1日", Some(0)),
        );
        let doc = ExtractedDocument::new(fields, vec!["2025年4月31日".into()]);
        assert!(check_dates(&doc, &ctx()).is_empty());
    }
}
