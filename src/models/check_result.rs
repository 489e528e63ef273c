//! Outcome of one verification run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::finding::{Finding, Severity};

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Finished with no error-level findings.
    Completed,
    /// Finished, but at least one error-level finding was reported.
    CompletedWithErrors,
    /// The run could not finish; the single finding describes why.
    Failed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Completed => "completed",
            CheckStatus::CompletedWithErrors => "completed_with_errors",
            CheckStatus::Failed => "failed",
        }
    }
}

/// Ordered findings plus a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
    /// Raw model output kept for diagnostics when parsing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl CheckResult {
    /// Start an empty, in-progress result.
    pub fn new() -> Self {
        Self {
            status: CheckStatus::Completed,
            findings: Vec::new(),
            diagnostics: None,
        }
    }

    /// A failed run carrying one synthetic finding.
    pub fn failed(finding: Finding, diagnostics: Option<String>) -> Self {
        Self {
            status: CheckStatus::Failed,
            findings: vec![finding],
            diagnostics,
        }
    }

    /// Append findings from one check phase.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    /// Drop exact duplicates, sort by severity and settle the status.
    ///
    /// Sorting is stable so detection order survives within a severity band.
    pub fn finalize(mut self) -> Self {
        if self.status == CheckStatus::Failed {
            return self;
        }

        let mut seen = HashSet::new();
        self.findings.retain(|f| seen.insert((f.category.clone(), f.message.clone())));
        self.findings.sort_by_key(|f| f.severity);

        self.status = if self.error_count() > 0 {
            CheckStatus::CompletedWithErrors
        } else {
            CheckStatus::Completed
        };
        self
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

impl Default for CheckResult {
    fn default() -> Self {
        Self::new()
    }
}
