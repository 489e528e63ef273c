//! End-to-end verification runs against a scripted vision client.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use deedcheck::llm::{ExtractionError, TokenBudget, VisionClient};
use deedcheck::models::{categories, Location, PageImage};
use deedcheck::{CheckStatus, DocumentType, Severity, Verifier, VerifyConfig};

struct FakeClient {
    replies: Mutex<VecDeque<Result<String, ExtractionError>>>,
}

impl FakeClient {
    fn new<I: IntoIterator<Item = Result<&'static str, ExtractionError>>>(replies: I) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
        }
    }
}

#[async_trait]
impl VisionClient for FakeClient {
    async fn extract(
        &self,
        _pages: &[PageImage],
        _instruction: &str,
        _budget: TokenBudget,
    ) -> Result<String, ExtractionError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ExtractionError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

fn pages(n: usize) -> Vec<PageImage> {
    (0..n).map(|i| PageImage::jpeg(i, vec![0xFF, 0xD8, 0xFF])).collect()
}

fn config() -> VerifyConfig {
    VerifyConfig::default().with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

#[tokio::test]
async fn contract_amount_mismatch_and_truncated_findings() {
    // The findings answer is cut off mid-object and still yields the complete one.
    let client = FakeClient::new([
        Ok(r#"```json
[{"severity": "warning", "category": "typo", "message": "売主の住所表記が頁によって異なる", "image_index": 1},
 {"severity": "error", "message": "手付金の"#),
        Ok(r#"{"fields": {
            "seller_name": {"value": "山田太郎", "page": 0},
            "buyer_name": {"value": "佐藤花子", "page": 0},
            "property_location": {"value": "東京都港区芝一丁目", "page": 0},
            "sale_price_amount": {"value": "30,000,000円", "page": 0},
            "sale_price_amount_written": {"value": "金参阡萬円", "page": 0},
            "deposit_amount": {"value": "1,000,000円", "page": 1},
            "deposit_amount_written": {"value": "金壱拾萬円也", "page": 1},
            "contract_date": {"value": "令和7年4月1日", "page": 0},
            "settlement_date": {"value": "令和7年5月30日", "page": 1}
          },
          "page_text": ["売買契約書 売買代金 金参阡萬円", "手付金 金壱拾萬円也"]}"#),
    ]);
    let verifier = Verifier::new(client, config());

    let result = verifier.run(&pages(2), DocumentType::Contract, None).await;

    assert_eq!(result.status, CheckStatus::CompletedWithErrors);
    assert_eq!(result.findings.len(), 2);

    let mismatch = &result.findings[0];
    assert_eq!(mismatch.severity, Severity::Error);
    assert_eq!(mismatch.category, categories::AMOUNT_MISMATCH);
    assert_eq!(mismatch.location, Some(Location::page(1)));

    let typo = &result.findings[1];
    assert_eq!(typo.severity, Severity::Warning);
    assert_eq!(typo.location.as_ref().and_then(|l| l.page_index()), Some(1));
}

#[tokio::test]
async fn equipment_list_numbering() {
    let client = FakeClient::new([
        Ok("[]"),
        Ok(r#"{"fields": {"item_numbers": {"value": ["1", "2", "4", "4", "6"], "page": 0}},
               "page_text": ["付帯設備表\n1. 給湯器 有\n2. エアコン 撤去\n4. 照明 未記入"]}"#),
    ]);
    let verifier = Verifier::new(client, config());

    let result = verifier.run(&pages(1), DocumentType::Equipment, None).await;
    assert_eq!(result.status, CheckStatus::CompletedWithErrors);

    let count = |category: &str| {
        result
            .findings
            .iter()
            .filter(|f| f.category == category)
            .count()
    };
    assert_eq!(count(categories::SEQUENCE_DUPLICATE), 1);
    assert_eq!(count(categories::SEQUENCE_GAP), 1);
    assert_eq!(count(categories::PLACEHOLDER), 1);
    assert_eq!(result.findings[0].category, categories::SEQUENCE_DUPLICATE);
}

#[tokio::test]
async fn empty_answers_give_clean_result() {
    let client = FakeClient::new([Ok("[]"), Ok(r#"{"fields": {}, "page_text": []}"#)]);
    let verifier = Verifier::new(client, config());

    let result = verifier.run(&pages(1), DocumentType::Auto, None).await;
    assert_eq!(result.status, CheckStatus::Completed);
    assert!(result.findings.is_empty());
}

#[tokio::test]
async fn safety_block_fails_the_run() {
    let blocked = || ExtractionError::SafetyBlock {
        categories: vec!["HARM_CATEGORY_DANGEROUS_CONTENT".to_string()],
        finish_reason: Some("SAFETY".to_string()),
    };
    let client = FakeClient::new([Err(blocked())]);
    let verifier = Verifier::new(client, config());

    let result = verifier.run(&pages(12), DocumentType::Disclosure, None).await;
    assert_eq!(result.status, CheckStatus::Failed);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].category, categories::SAFETY_BLOCK);
    assert!(result.findings[0].message.contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
}

#[tokio::test]
async fn disclosure_cross_check_with_reference_values() {
    let client = FakeClient::new([
        Ok(r#"{"findings": [],
               "fields": {
                 "license_holder_name": {"value": "鈴木一郎", "page": 0},
                 "license_holder_registration": {"value": "東京第012345号", "page": 0},
                 "broker_license_number": {"value": "東京都知事(3)第12345号", "page": 0},
                 "escrow_office": {"value": "大阪法務局", "page": 1},
                 "land_category": {"value": "宅地", "page": 1},
                 "floor_area_ratio": {"value": "200%", "page": 1}
               }}"#),
        Ok(r#"{"evidence": {
                 "land_category": {"value": "宅地", "page": 0},
                 "land_area": {"value": "１２０．５０㎡", "page": 0},
                 "lot_number": {"value": "一番二", "page": 1}
               },
               "disclosure": {
                 "land_category": {"value": "宅地", "page": 3},
                 "land_area": {"value": "120.50㎡", "page": 3},
                 "lot_number": {"value": "1番2", "page": 3}
               },
               "findings": [{"severity": "info", "message": "公図の縮尺が記載されていない", "image_index": 1}]}"#),
    ]);
    let cfg = config().with_reference_value("escrow_office", "東京法務局");
    let verifier = Verifier::new(client, cfg);

    let result = verifier
        .run(&pages(2), DocumentType::Disclosure, Some(&pages(2)))
        .await;

    assert_eq!(result.status, CheckStatus::CompletedWithErrors);

    let reference = &result.findings[0];
    assert_eq!(reference.category, categories::REFERENCE_MISMATCH);
    // Page 1 of the disclosure is image 3 after two evidence pages.
    assert_eq!(reference.location, Some(Location::page(3)));

    assert!(result.findings.iter().any(|f| {
        f.category == categories::NOTATION_MISMATCH && f.field_name.as_deref() == Some("lot_number")
    }));
    assert!(!result
        .findings
        .iter()
        .any(|f| f.category == categories::FIELD_MISMATCH));
    assert_eq!(result.findings.last().map(|f| f.severity), Some(Severity::Info));
}
