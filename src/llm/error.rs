//! Extraction failures.

use thiserror::Error;

/// Coarse kind of an extraction failure, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SafetyBlock,
    Transport,
    EmptyResponse,
    NotConfigured,
}

/// Errors from the AI extraction adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error(
        "Blocked by the model's content filter ({})",
        describe_block(.categories, .finish_reason)
    )]
    SafetyBlock {
        /// Harm categories reported as blocked.
        categories: Vec<String>,
        finish_reason: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

fn describe_block(categories: &[String], finish_reason: &Option<String>) -> String {
    let categories = if categories.is_empty() {
        "no category reported".to_string()
    } else {
        categories.join(", ")
    };
    match finish_reason {
        Some(reason) => format!("{categories}; reason {reason}"),
        None => categories,
    }
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractionError::SafetyBlock { .. } => FailureKind::SafetyBlock,
            ExtractionError::Transport(_) => FailureKind::Transport,
            ExtractionError::EmptyResponse => FailureKind::EmptyResponse,
            ExtractionError::NotConfigured(_) => FailureKind::NotConfigured,
        }
    }

    /// What the user can do about it.
    pub fn remediation(&self) -> &'static str {
        match self {
            ExtractionError::SafetyBlock { .. } => {
                "Reduce the number of pages (split the PDF) and retry"
            }
            ExtractionError::Transport(_) => {
                "Check network access and the API endpoint, then retry"
            }
            ExtractionError::EmptyResponse => "Retry; if it keeps happening, try another model",
            ExtractionError::NotConfigured(_) => {
                "Set GEMINI_API_KEY (or GOOGLE_API_KEY) in the environment or .env file"
            }
        }
    }
}
