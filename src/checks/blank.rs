//! Required-field presence and placeholder detection.

use crate::models::{categories, ExtractedDocument, FieldValue, Finding, Location};

/// Whole-value tokens that mean "not filled in yet".
const PLACEHOLDER_WORDS: &[&str] = &["未記入", "未定", "記入なし", "TBD", "N/A"];

/// Characters used to draw blank lines and empty brackets on forms.
fn is_blank_marker(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '_' | '＿' | '-' | '－' | 'ー' | '―' | '‐' | '(' | ')' | '（' | '）' | '・' | '…' | '　'
        )
}

/// Whether a text value is empty, whitespace or a placeholder.
pub fn is_placeholder(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty()
        || PLACEHOLDER_WORDS.contains(&trimmed)
        || trimmed.chars().all(is_blank_marker)
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => is_placeholder(s),
        other => other.is_empty(),
    }
}

/// Warn for every required field that is missing, blank or a placeholder.
pub fn check_required(doc: &ExtractedDocument, required: &[String]) -> Vec<Finding> {
    required
        .iter()
        .filter_map(|name| match doc.get(name) {
            None => Some(
                Finding::warning(
                    categories::BLANK_FIELD,
                    format!("Required field {name} was not found"),
                )
                .with_location(Some(Location::label(name.clone())))
                .with_field(name.clone()),
            ),
            Some(field) if is_blank(&field.value) => {
                let shown = field.value.as_text().unwrap_or_default().trim().to_string();
                let message = if shown.is_empty() {
                    format!("Required field {name} is blank")
                } else {
                    format!("Required field {name} holds the placeholder \"{shown}\"")
                };
                Some(
                    Finding::warning(categories::BLANK_FIELD, message)
                        .with_location(field.page.map(Location::page))
                        .with_field(name.clone()),
                )
            }
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedField;

    #[test]
    fn test_placeholder_values() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("   "));
        assert!(is_placeholder("　　"));
        assert!(is_placeholder("（　）"));
        assert!(is_placeholder("＿＿＿"));
        assert!(is_placeholder("___"));
        assert!(is_placeholder("－－－－－"));
        assert!(is_placeholder("未記入"));
        assert!(is_placeholder(" 未定 "));
        assert!(!is_placeholder("山田太郎"));
        assert!(!is_placeholder("未定稿あり"));
    }

    #[test]
    fn test_required_is_set_difference() {
        let doc: ExtractedDocument = [
            ("seller_name".to_string(), ExtractedField::text("山田太郎", Some(0))),
            ("buyer_name".to_string(), ExtractedField::text("（　）", Some(0))),
            (
                "contract_date".to_string(),
                ExtractedField::new(FieldValue::Empty, None),
            ),
        ]
        .into_iter()
        .collect();

        let required: Vec<String> = [
            "seller_name",
            "buyer_name",
            "contract_date",
            "property_location",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let findings = check_required(&doc, &required);
        let names: Vec<_> = findings
            .iter()
            .filter_map(|f| f.field_name.as_deref())
            .collect();
        assert_eq!(names, vec!["buyer_name", "contract_date", "property_location"]);
        assert!(findings.iter().all(|f| f.category == categories::BLANK_FIELD));
        assert_eq!(findings[0].location, Some(Location::page(0)));
    }

    #[test]
    fn test_numbers_are_never_blank() {
        let doc: ExtractedDocument = [(
            "floor_area_ratio".to_string(),
            ExtractedField::new(FieldValue::Number(0.0), None),
        )]
        .into_iter()
        .collect();
        assert!(check_required(&doc, &["floor_area_ratio".to_string()]).is_empty());
    }
}
