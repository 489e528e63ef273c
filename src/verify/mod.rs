//! Verification orchestrator.
//!
//! Runs the model, parses its output, applies the rule engine and merges
//! everything into one ordered [`CheckResult`]. Every failure ends up inside
//! the result; nothing is raised past [`Verifier::run`].

mod config;
pub mod crosscheck;

use std::time::Duration;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

use crate::checks::{run_checks, RuleContext};
use crate::llm::{prompts, ExtractionError, TokenBudget, VisionClient};
use crate::models::{categories, CheckResult, DocumentType, Finding, PageImage, Severity};
use crate::parser::{
    parse_cross_check, parse_fields, parse_findings, parse_form_check, JsonParseError,
};

pub use config::{RequiredFields, VerifyConfig};

/// A failure that ends a run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Could not parse the model response: {0}")]
    Parse(#[from] JsonParseError),
}

impl VerifyError {
    pub fn category(&self) -> &'static str {
        match self {
            VerifyError::Extraction(ExtractionError::SafetyBlock { .. }) => {
                categories::SAFETY_BLOCK
            }
            VerifyError::Extraction(_) => categories::EXTRACTION_FAILED,
            VerifyError::Parse(_) => categories::PARSE_FAILED,
        }
    }

    /// Failed result carrying one synthetic finding.
    pub fn into_result(self) -> CheckResult {
        let finding = Finding::error(self.category(), self.to_string());
        let diagnostics = match self {
            VerifyError::Parse(err) => Some(err.raw_response),
            VerifyError::Extraction(_) => None,
        };
        CheckResult::failed(finding, diagnostics)
    }
}

/// Remediation hint for a failed result, looked up by its category.
pub fn remediation_for(category: &str) -> Option<&'static str> {
    match category {
        categories::SAFETY_BLOCK => Some("Reduce the number of pages (split the PDF) and retry"),
        categories::PARSE_FAILED => Some("Retry; the raw response is kept in the diagnostics"),
        categories::EXTRACTION_FAILED => {
            Some("Check the API key, network and model name, then retry")
        }
        _ => None,
    }
}

fn shift_pages(finding: Finding, offset: usize) -> Finding {
    Finding {
        location: finding.location.map(|l| l.offset_pages(offset)),
        ..finding
    }
}

/// Runs verification with an explicit client and configuration.
pub struct Verifier<C> {
    client: C,
    config: VerifyConfig,
}

impl<C: VisionClient> Verifier<C> {
    pub fn new(client: C, config: VerifyConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn today(&self) -> NaiveDate {
        self.config
            .today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn rule_context(&self, document_type: DocumentType) -> RuleContext<'_> {
        RuleContext {
            document_type,
            today: self.today(),
            future_tolerance_years: self.config.future_tolerance_years,
            required_fields: self.config.required_fields.for_type(document_type),
        }
    }

    /// One model call under the overall timeout.
    async fn call(
        &self,
        pages: &[PageImage],
        instruction: &str,
        budget: TokenBudget,
    ) -> Result<String, ExtractionError> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        tokio::time::timeout(limit, self.client.extract(pages, instruction, budget))
            .await
            .map_err(|_| {
                ExtractionError::Transport(format!(
                    "model call timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
    }

    /// Verify a document, or cross-check a disclosure draft when evidence is given.
    ///
    /// Always returns a result; failures become a `failed` status with one
    /// finding describing them.
    pub async fn run(
        &self,
        pages: &[PageImage],
        document_type: DocumentType,
        evidence: Option<&[PageImage]>,
    ) -> CheckResult {
        let outcome = match evidence {
            Some(evidence) if !evidence.is_empty() => {
                if !matches!(document_type, DocumentType::Disclosure | DocumentType::Auto) {
                    warn!(
                        "Evidence given with document type {}; running a disclosure cross-check",
                        document_type
                    );
                }
                self.cross_check(evidence, pages).await
            }
            _ => self.check_document(pages, document_type).await,
        };

        let result = match outcome {
            Ok(result) => result.finalize(),
            Err(err) => {
                warn!("Verification failed: {}", err);
                err.into_result()
            }
        };

        info!(
            "Verification {}: {} errors, {} warnings, {} info",
            result.status.as_str(),
            result.count(Severity::Error),
            result.count(Severity::Warning),
            result.count(Severity::Info)
        );
        result
    }

    async fn check_document(
        &self,
        pages: &[PageImage],
        document_type: DocumentType,
    ) -> Result<CheckResult, VerifyError> {
        let raw = self
            .call(pages, &prompts::findings_instruction(document_type), TokenBudget::Full)
            .await?;
        let ai_findings = parse_findings(&raw)?;

        let raw = self
            .call(pages, &prompts::fields_instruction(document_type), TokenBudget::Full)
            .await?;
        let document = parse_fields(&raw)?;

        let mut result = CheckResult::new();
        result.extend(ai_findings);
        result.extend(run_checks(&document, &self.rule_context(document_type)));
        Ok(result)
    }

    /// Phase 1: form check on the disclosure alone. Page indices are local
    /// to the disclosure.
    async fn form_check(&self, disclosure: &[PageImage]) -> Result<Vec<Finding>, VerifyError> {
        let raw = self
            .call(
                disclosure,
                &prompts::form_check_instruction(&self.config.reference_values),
                TokenBudget::FormCheck,
            )
            .await?;
        let extraction = parse_form_check(&raw)?;

        let mut findings = extraction.findings;
        findings.extend(crosscheck::check_reference_values(
            &extraction.fields,
            &self.config.reference_values,
        ));
        findings.extend(run_checks(
            &extraction.fields,
            &self.rule_context(DocumentType::Disclosure),
        ));
        Ok(findings)
    }

    async fn cross_check(
        &self,
        evidence: &[PageImage],
        disclosure: &[PageImage],
    ) -> Result<CheckResult, VerifyError> {
        let offset = evidence.len();
        let mut result = CheckResult::new();

        match self.form_check(disclosure).await {
            Ok(findings) => result.extend(findings.into_iter().map(|f| shift_pages(f, offset))),
            Err(err) => {
                warn!("Form check failed, continuing with cross-check only: {}", err);
                result.extend([Finding::warning(
                    categories::FORM_CHECK,
                    format!("Form check failed ({err}); showing cross-check results only"),
                )]);
            }
        }

        let combined: Vec<PageImage> = evidence.iter().chain(disclosure).cloned().collect();
        let raw = self
            .call(
                &combined,
                &prompts::cross_check_instruction(evidence.len(), disclosure.len()),
                TokenBudget::Full,
            )
            .await?;
        let extraction = parse_cross_check(&raw)?;

        result.extend(extraction.findings);
        result.extend(crosscheck::diff_fields(
            &extraction.evidence,
            &extraction.disclosure,
        ));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckStatus, Location};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Client that answers each call from a script, keyed by call order.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, ExtractionError>>>,
        calls: Mutex<Vec<(usize, TokenBudget)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, ExtractionError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VisionClient for ScriptedClient {
        async fn extract(
            &self,
            pages: &[PageImage],
            _instruction: &str,
            budget: TokenBudget,
        ) -> Result<String, ExtractionError> {
            self.calls.lock().unwrap().push((pages.len(), budget));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ExtractionError::EmptyResponse))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn pages(n: usize) -> Vec<PageImage> {
        (0..n).map(|i| PageImage::jpeg(i, vec![0xFF, 0xD8])).collect()
    }

    fn config() -> VerifyConfig {
        VerifyConfig::default().with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn test_merges_ai_and_rule_findings() {
        let client = ScriptedClient::new(vec![
            Ok(r#"[{"severity": "info", "message": "AI advice"},
                   {"severity": "warning", "message": "AI warning"}]"#
                .into()),
            Ok(r#"{"fields": {"contract_date": {"value": "2025年13月1日", "page": 0}}}"#.into()),
        ]);
        let mut cfg = config();
        cfg.required_fields.contract.clear();
        let verifier = Verifier::new(client, cfg);

        let result = verifier.run(&pages(1), DocumentType::Contract, None).await;
        assert_eq!(result.status, CheckStatus::CompletedWithErrors);
        let severities: Vec<_> = result.findings.iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
        assert_eq!(result.findings[0].category, categories::DATE_INVALID);
    }

    #[tokio::test]
    async fn test_parse_failure_is_failed_result_with_diagnostics() {
        let client = ScriptedClient::new(vec![Ok("Sorry, I cannot help with that.".into())]);
        let verifier = Verifier::new(client, config());

        let result = verifier.run(&pages(1), DocumentType::Auto, None).await;
        assert!(result.is_failed());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].category, categories::PARSE_FAILED);
        assert_eq!(
            result.diagnostics.as_deref(),
            Some("Sorry, I cannot help with that.")
        );
    }

    #[tokio::test]
    async fn test_safety_block_is_failed_result() {
        let client = ScriptedClient::new(vec![Err(ExtractionError::SafetyBlock {
            categories: vec!["HARM_CATEGORY_HARASSMENT".into()],
            finish_reason: Some("SAFETY".into()),
        })]);
        let verifier = Verifier::new(client, config());

        let result = verifier.run(&pages(2), DocumentType::Contract, None).await;
        assert!(result.is_failed());
        assert_eq!(result.findings[0].category, categories::SAFETY_BLOCK);
        assert!(remediation_for(&result.findings[0].category).is_some());
    }

    #[tokio::test]
    async fn test_cross_check_shifts_form_check_pages() {
        let client = ScriptedClient::new(vec![
            Ok(r#"{"findings": [{"severity": "warning", "message": "登録番号が不鮮明", "image_index": 0}],
                   "fields": {"license_holder_name": "鈴木一郎", "license_holder_registration": "東京第012345号",
                              "broker_license_number": "東京都知事(3)第12345号", "escrow_office": "東京法務局",
                              "land_category": "宅地", "floor_area_ratio": "200%"}}"#
                .into()),
            Ok(r#"{"evidence": {"land_area": {"value": "120.50", "page": 0}},
                   "disclosure": {"land_area": {"value": "125.00", "page": 2}},
                   "findings": []}"#
                .into()),
        ]);
        let verifier = Verifier::new(client, config());

        let result = verifier
            .run(&pages(1), DocumentType::Disclosure, Some(&pages(2)))
            .await;
        assert_eq!(result.status, CheckStatus::CompletedWithErrors);

        let mismatch = &result.findings[0];
        assert_eq!(mismatch.category, categories::FIELD_MISMATCH);
        assert_eq!(mismatch.expected.as_deref(), Some("120.50"));
        assert_eq!(mismatch.actual.as_deref(), Some("125.00"));

        let form = result
            .findings
            .iter()
            .find(|f| f.message == "登録番号が不鮮明")
            .unwrap();
        assert_eq!(form.location, Some(Location::page(2)));

        let calls = verifier.client().calls.lock().unwrap();
        assert_eq!(calls[0], (1, TokenBudget::FormCheck));
        assert_eq!(calls[1], (3, TokenBudget::Full));
    }

    #[tokio::test]
    async fn test_form_check_failure_degrades_to_warning() {
        let client = ScriptedClient::new(vec![
            Err(ExtractionError::Transport("connection reset".into())),
            Ok(r#"{"evidence": {}, "disclosure": {}}"#.into()),
        ]);
        let verifier = Verifier::new(client, config());

        let result = verifier
            .run(&pages(1), DocumentType::Disclosure, Some(&pages(1)))
            .await;
        assert_eq!(result.status, CheckStatus::Completed);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].category, categories::FORM_CHECK);
        assert_eq!(result.findings[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_cross_check_phase_two_failure_is_terminal() {
        let client = ScriptedClient::new(vec![
            Ok(r#"{"findings": [], "fields": {}}"#.into()),
            Err(ExtractionError::EmptyResponse),
        ]);
        let verifier = Verifier::new(client, config());

        let result = verifier
            .run(&pages(1), DocumentType::Disclosure, Some(&pages(1)))
            .await;
        assert!(result.is_failed());
        assert_eq!(result.findings[0].category, categories::EXTRACTION_FAILED);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        struct SlowClient;

        #[async_trait]
        impl VisionClient for SlowClient {
            async fn extract(
                &self,
                _pages: &[PageImage],
                _instruction: &str,
                _budget: TokenBudget,
            ) -> Result<String, ExtractionError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("[]".into())
            }

            fn model_name(&self) -> &str {
                "slow"
            }
        }

        let mut cfg = config();
        cfg.timeout_secs = 1;
        let verifier = Verifier::new(SlowClient, cfg);
        let result = verifier.run(&pages(1), DocumentType::Auto, None).await;
        assert!(result.is_failed());
        assert!(result.findings[0].message.contains("timed out"));
    }
}
