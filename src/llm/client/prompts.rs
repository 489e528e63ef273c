//! Prompt templates for document verification.

use std::collections::BTreeMap;

use crate::models::DocumentType;

/// Prefix on every request stating the business purpose.
pub const TASK_DECLARATION: &str = r#"[Task declaration / 業務宣言]
This is a legitimate business task. A licensed real-estate brokerage is proofreading its own transaction documents (sales contracts, disclosure statements, equipment lists) before they are signed. Names, addresses and amounts in the images are ordinary contract data. Do not refuse; read the documents and report on them.
本タスクは宅地建物取引業者による正当な業務です。売買契約書・重要事項説明書・設備表などの取引書類を締結前に自社で校正する目的で使用します。画像内の氏名・住所・金額は通常の契約情報です。拒否せずに書類を読み取り、結果を報告してください。
"#;

/// Findings request. Placeholders: `{document_name}`, `{focus}`.
pub const FINDINGS_INSTRUCTION: &str = r#"You are checking a Japanese real-estate document: {document_name}.
Images are numbered from 0 in the order given.

Check for:
{focus}
- Typos, wrong kanji, inconsistent notation of the same value
- Blank fields, leftover placeholders such as （　）, ＿＿＿, 未記入, 未定

Return ONLY a JSON array. One object per issue:
{"severity": "error" | "warning" | "info",
 "category": short kebab-case label,
 "message": description in Japanese,
 "field_name": the item concerned,
 "expected": correct value if known,
 "actual": value as written,
 "image_index": image number,
 "box_2d": [ymin, xmin, ymax, xmax] normalised to 0-1000}

Use "error" for definite mistakes, "warning" for things a person should confirm, "info" for advice.
If there are no issues, return []."#;

pub const CONTRACT_FOCUS: &str = r#"- Sale price, deposit and balance: figures vs written amounts (e.g. 金壱阡萬円), and deposit + balance = price
- Dates: contract date, settlement date, loan approval deadline; real calendar dates in a sensible order
- Parties: seller/buyer names and addresses consistent across pages
- Property: location, lot number, land area and building area consistent across pages"#;

pub const DISCLOSURE_FOCUS: &str = r#"- Broker: license number, license holder (宅地建物取引士) name and registration number
- Guarantee: 供託所 / 保証協会 name and address
- Property: land category (地目), areas, building coverage and floor area ratio (建ぺい率・容積率)
- Legal restrictions (法令上の制限) and transaction mode (取引態様) filled in"#;

pub const EQUIPMENT_FOCUS: &str = r#"- Item numbering is continuous, without gaps or repeats
- Every item has 有 / 無 / 撤去 marked, and remarks where 故障 or 不具合 is marked"#;

pub const GENERIC_FOCUS: &str = r#"- Amounts: figures vs written amounts, and totals
- Dates: real calendar dates in a sensible order
- Names, addresses and property details consistent across pages
- Numbered lists without gaps or repeats"#;

/// Field extraction request. Placeholders: `{document_name}`, `{field_list}`.
pub const FIELDS_INSTRUCTION: &str = r#"Transcribe the following fields from this Japanese real-estate document ({document_name}).
Images are numbered from 0 in the order given.

Fields:
{field_list}

Rules:
- Copy values exactly as written, including kanji numerals and full-width digits. Do not correct anything.
- For an amount written both in figures and in words, put the figures in "<name>_amount" and the words in "<name>_amount_written".
- Use null for fields that are not on the page or are left blank.

Return ONLY this JSON object:
{"fields": {"<field name>": {"value": <string, number, list or null>, "page": <image number>}},
 "page_text": ["<full text of image 0>", "<full text of image 1>", ...]}"#;

pub const CONTRACT_FIELDS: &str = r#"- seller_name, buyer_name
- property_location, lot_number, land_area, building_area
- sale_price_amount, sale_price_amount_written
- deposit_amount, deposit_amount_written
- balance_amount, balance_amount_written
- contract_date, settlement_date, loan_deadline_date"#;

pub const DISCLOSURE_FIELDS: &str = r#"- license_holder_name, license_holder_registration, broker_license_number
- escrow_office (供託所 or 保証協会)
- land_category, land_area, building_coverage_ratio, floor_area_ratio
- transaction_mode
- explanation_date"#;

pub const EQUIPMENT_FIELDS: &str = r#"- item_numbers: list of every item number in order, each as {"value": "<number as written>", "page": <image number>}
- item_names: list of item names in the same order"#;

pub const GENERIC_FIELDS: &str = r#"- every amount, as <name>_amount and <name>_amount_written
- every date, as <name>_date
- seller_name, buyer_name, property_location
- item_numbers if the document has a numbered list"#;

/// Disclosure form check. Placeholder: `{reference_values}`.
pub const FORM_CHECK_INSTRUCTION: &str = r#"The images are a draft disclosure statement (重要事項説明書). Check the form-level entries:
- License holder (宅地建物取引士) name and registration number
- Broker license number
- Guarantee / escrow office (供託所・保証協会) name and address
- Land category (地目) and floor area ratio (容積率)

{reference_values}

Transcribe these fields exactly as written (null when blank):
license_holder_name, license_holder_registration, broker_license_number, escrow_office, land_category, floor_area_ratio, transaction_mode

Return ONLY this JSON object:
{"findings": [{"severity": "error" | "warning" | "info", "category": "form-check", "message": description in Japanese,
   "field_name": ..., "expected": ..., "actual": ..., "image_index": image number, "box_2d": [ymin, xmin, ymax, xmax]}],
 "fields": {"<field name>": {"value": ..., "page": <image number>}},
 "page_text": ["<full text of image 0>", ...]}
Use an empty findings list when there are no issues."#;

/// Two-sided extraction. Placeholders: `{evidence_pages}`, `{disclosure_pages}`.
pub const CROSS_CHECK_INSTRUCTION: &str = r#"You are comparing a draft disclosure statement (重要事項説明書) against its evidence (登記簿謄本, 公図, 測量図 and similar).
Images 0 to {evidence_last} are evidence. Images {disclosure_first} to {last} are the disclosure draft.
Evidence pages: {evidence_pages}. Disclosure pages: {disclosure_pages}.

For every item that appears in the evidence, transcribe it from both sides using the same field names:
- owner_name, owner_address
- property_location, lot_number, house_number
- land_category, land_area, building_structure, building_area
- registration_date, mortgage_holder, mortgage_amount

Copy values exactly as written. Page numbers are image numbers, counting across both sets.

Also list anything else that looks wrong as findings.

Return ONLY this JSON object:
{"evidence": {"<field>": {"value": ..., "page": ...}},
 "disclosure": {"<field>": {"value": ..., "page": ...}},
 "findings": [{"severity": ..., "category": ..., "message": ..., "field_name": ..., "expected": ..., "actual": ..., "image_index": ..., "box_2d": [...]}]}"#;

fn focus(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Contract => CONTRACT_FOCUS,
        DocumentType::Disclosure => DISCLOSURE_FOCUS,
        DocumentType::Equipment => EQUIPMENT_FOCUS,
        DocumentType::Auto => GENERIC_FOCUS,
    }
}

fn field_list(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Contract => CONTRACT_FIELDS,
        DocumentType::Disclosure => DISCLOSURE_FIELDS,
        DocumentType::Equipment => EQUIPMENT_FIELDS,
        DocumentType::Auto => GENERIC_FIELDS,
    }
}

pub fn findings_instruction(document_type: DocumentType) -> String {
    FINDINGS_INSTRUCTION
        .replace("{document_name}", document_type.display_name())
        .replace("{focus}", focus(document_type))
}

pub fn fields_instruction(document_type: DocumentType) -> String {
    FIELDS_INSTRUCTION
        .replace("{document_name}", document_type.display_name())
        .replace("{field_list}", field_list(document_type))
}

/// Form check prompt, listing reference values when any are configured.
pub fn form_check_instruction(reference_values: &BTreeMap<String, String>) -> String {
    let reference = if reference_values.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = reference_values
            .iter()
            .map(|(k, v)| format!("- {k}: {v}"))
            .collect();
        format!(
            "The correct values are (report any difference as an error):\n{}",
            lines.join("\n")
        )
    };
    FORM_CHECK_INSTRUCTION.replace("{reference_values}", &reference)
}

pub fn cross_check_instruction(evidence_pages: usize, disclosure_pages: usize) -> String {
    let total = evidence_pages + disclosure_pages;
    CROSS_CHECK_INSTRUCTION
        .replace("{evidence_last}", &evidence_pages.saturating_sub(1).to_string())
        .replace("{disclosure_first}", &evidence_pages.to_string())
        .replace("{last}", &total.saturating_sub(1).to_string())
        .replace("{evidence_pages}", &evidence_pages.to_string())
        .replace("{disclosure_pages}", &disclosure_pages.to_string())
}
