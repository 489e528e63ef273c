//! Rule-based checking engine.
//!
//! Deterministic validators that run on extracted fields and page text,
//! independent of what the model itself reported. The set of validators is
//! closed and chosen per [`DocumentType`].

pub mod amount;
pub mod blank;
pub mod date;
pub mod normalize;
pub mod sequence;
pub mod text;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DocumentType, ExtractedDocument, FieldValue, Finding};

use sequence::SequenceItem;

/// Field holding the numbered entries of an equipment list.
pub const ITEM_NUMBERS_FIELD: &str = "item_numbers";

/// Inputs the validators need besides the document.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub document_type: DocumentType,
    /// Reference date for future-date checks.
    pub today: NaiveDate,
    /// Dates further than this many years past `today` are suspicious.
    pub future_tolerance_years: u32,
    pub required_fields: &'a [String],
}

/// One deterministic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// `*_amount` figures vs `*_amount_written`.
    Amount,
    /// `*_date` fields, or dates in page text when there are none.
    Date,
    /// Configured required fields are present and filled in.
    RequiredFields,
    /// Item numbering has no gaps or duplicates.
    Sequence,
    /// Leftover blank markers in page text.
    Placeholders,
    /// Short or unseparated yen figures in page text.
    AmountText,
    /// Disclosure headings and transaction mode.
    DisclosureText,
    /// Equipment vocabulary.
    EquipmentText,
}

impl Validator {
    /// Validators that apply to a document type.
    pub fn for_document(document_type: DocumentType) -> &'static [Validator] {
        use Validator::*;
        match document_type {
            DocumentType::Contract => &[Amount, Date, RequiredFields, Placeholders, AmountText],
            DocumentType::Disclosure => {
                &[Amount, Date, RequiredFields, Placeholders, DisclosureText]
            }
            DocumentType::Equipment => &[Sequence, RequiredFields, Placeholders, EquipmentText],
            DocumentType::Auto => {
                &[Amount, Date, RequiredFields, Sequence, Placeholders, AmountText]
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Validator::Amount => "amount",
            Validator::Date => "date",
            Validator::RequiredFields => "required-fields",
            Validator::Sequence => "sequence",
            Validator::Placeholders => "placeholders",
            Validator::AmountText => "amount-text",
            Validator::DisclosureText => "disclosure-text",
            Validator::EquipmentText => "equipment-text",
        }
    }

    pub fn run(&self, doc: &ExtractedDocument, ctx: &RuleContext<'_>) -> Vec<Finding> {
        match self {
            Validator::Amount => amount::check_amounts(doc),
            Validator::Date => date::check_dates(doc, ctx),
            Validator::RequiredFields => blank::check_required(doc, ctx.required_fields),
            Validator::Sequence => {
                let items = item_numbers(doc, ctx.document_type);
                sequence::check_sequence(ITEM_NUMBERS_FIELD, &items)
            }
            Validator::Placeholders => text::scan_placeholders(doc.page_text()),
            Validator::AmountText => text::scan_amounts(doc.page_text()),
            Validator::DisclosureText => text::scan_disclosure(doc.page_text()),
            Validator::EquipmentText => text::scan_equipment(doc.page_text()),
        }
    }
}

/// Item numbers from the `item_numbers` field, falling back to numbered
/// lines in the page text for equipment lists.
fn item_numbers(doc: &ExtractedDocument, document_type: DocumentType) -> Vec<SequenceItem> {
    match doc.get(ITEM_NUMBERS_FIELD) {
        Some(field) => match &field.value {
            FieldValue::List(entries) => entries
                .iter()
                .filter_map(|entry| {
                    let label = entry.value.as_text()?;
                    Some(SequenceItem::new(label, entry.page.or(field.page)))
                })
                .collect(),
            other => other
                .as_text()
                .map(|s| {
                    s.split([',', '、', '，', ' '])
                        .filter(|part| !part.trim().is_empty())
                        .map(|part| SequenceItem::new(part.trim(), field.page))
                        .collect()
                })
                .unwrap_or_default(),
        },
        None if document_type == DocumentType::Equipment => text::list_numbers(doc.page_text()),
        None => Vec::new(),
    }
}

/// Run every validator for the context's document type, in order.
pub fn run_checks(doc: &ExtractedDocument, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for validator in Validator::for_document(ctx.document_type) {
        let found = validator.run(doc, ctx);
        debug!("{} validator: {} findings", validator.as_str(), found.len());
        findings.extend(found);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{categories, ExtractedField};
    use std::collections::BTreeMap;

    fn ctx(document_type: DocumentType, required: &[String]) -> RuleContext<'_> {
        RuleContext {
            document_type,
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            future_tolerance_years: 10,
            required_fields: required,
        }
    }

    #[test]
    fn test_contract_checks() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "sale_price_amount".to_string(),
            ExtractedField::text("1,000,000円", Some(0)),
        );
        fields.insert(
            "sale_price_amount_written".to_string(),
            ExtractedField::text("金拾萬円", Some(0)),
        );
        fields.insert(
            "contract_date".to_string(),
            ExtractedField::text("2025年13月1日", Some(0)),
        );
        let doc = ExtractedDocument::new(fields, vec!["買主（　）".into()]);
        let required = vec!["seller_name".to_string()];

        let findings = run_checks(&doc, &ctx(DocumentType::Contract, &required));
        let cats: Vec<_> = findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(
            cats,
            vec![
                categories::AMOUNT_MISMATCH,
                categories::DATE_INVALID,
                categories::BLANK_FIELD,
                categories::PLACEHOLDER,
            ]
        );
    }

    #[test]
    fn test_equipment_uses_item_number_list() {
        let entries = ["1", "2", "4", "4", "6"]
            .iter()
            .map(|n| ExtractedField::text(*n, Some(0)))
            .collect();
        let mut fields = BTreeMap::new();
        fields.insert(
            ITEM_NUMBERS_FIELD.to_string(),
            ExtractedField::new(FieldValue::List(entries), None),
        );
        let doc = ExtractedDocument::new(fields, vec!["設備表".into()]);

        let findings = run_checks(&doc, &ctx(DocumentType::Equipment, &[]));
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.category == categories::SEQUENCE_DUPLICATE)
                .count(),
            1
        );
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.category == categories::SEQUENCE_GAP)
                .count(),
            1
        );
    }

    #[test]
    fn test_equipment_falls_back_to_page_text() {
        let doc = ExtractedDocument::new(
            BTreeMap::new(),
            vec!["1. 給湯器 有\n2. エアコン 有\n4. 照明 無".into()],
        );
        let findings = run_checks(&doc, &ctx(DocumentType::Equipment, &[]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, categories::SEQUENCE_GAP);
    }

    #[test]
    fn test_comma_separated_item_numbers() {
        let doc: ExtractedDocument = [(
            ITEM_NUMBERS_FIELD.to_string(),
            ExtractedField::text("1, 2, 3", Some(0)),
        )]
        .into_iter()
        .collect();
        assert!(item_numbers(&doc, DocumentType::Auto).len() == 3);
    }

    #[test]
    fn test_auto_does_not_number_page_text() {
        let doc = ExtractedDocument::new(BTreeMap::new(), vec!["1. 目的\n3. 代金".into()]);
        let findings = run_checks(&doc, &ctx(DocumentType::Auto, &[]));
        assert!(findings
            .iter()
            .all(|f| f.category != categories::SEQUENCE_GAP));
    }
}
