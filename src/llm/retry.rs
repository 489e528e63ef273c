//! One-shot retry on safety blocks.
//!
//! Safety filters produce transient false positives on ordinary contracts, so
//! a block earns exactly one more attempt with the same inputs. Nothing else
//! is retried.

use std::future::Future;

use tracing::warn;

use super::error::{ExtractionError, FailureKind};

/// Where one logical extraction call is in its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    FirstAttempt,
    Retried { after: FailureKind },
}

impl RetryState {
    /// The state after `err`, or `None` when the error is final.
    ///
    /// The only transition is first attempt + safety block.
    pub fn next(self, err: &ExtractionError) -> Option<Self> {
        match (self, err.kind()) {
            (RetryState::FirstAttempt, FailureKind::SafetyBlock) => Some(RetryState::Retried {
                after: FailureKind::SafetyBlock,
            }),
            _ => None,
        }
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        match self {
            RetryState::FirstAttempt => 1,
            RetryState::Retried { .. } => 2,
        }
    }
}

/// Run `op`, retrying once if the first attempt is a safety block.
pub async fn with_safety_retry<F, Fut, T>(mut op: F) -> Result<T, ExtractionError>
where
    F: FnMut(RetryState) -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let first = RetryState::FirstAttempt;
    let err = match op(first).await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let Some(retried) = first.next(&err) else {
        return Err(err);
    };
    warn!("{}; retrying once with the same input", err);
    op(retried).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn blocked() -> ExtractionError {
        ExtractionError::SafetyBlock {
            categories: vec!["HARM_CATEGORY_HARASSMENT".into()],
            finish_reason: Some("SAFETY".into()),
        }
    }

    #[test]
    fn test_single_transition() {
        let retried = RetryState::FirstAttempt.next(&blocked()).unwrap();
        assert_eq!(retried.attempt(), 2);
        assert!(retried.next(&blocked()).is_none());
        assert!(RetryState::FirstAttempt
            .next(&ExtractionError::Transport("reset".into()))
            .is_none());
        assert!(RetryState::FirstAttempt
            .next(&ExtractionError::EmptyResponse)
            .is_none());
    }

    #[tokio::test]
    async fn test_block_then_success_returns_second_result() {
        let calls = AtomicU32::new(0);
        let result = with_safety_retry(|state| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match state {
                    RetryState::FirstAttempt => Err(blocked()),
                    RetryState::Retried { .. } => Ok("attempt 2"),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "attempt 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_two_blocks_raise_after_exactly_two_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_safety_retry(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(blocked()) }
        })
        .await;

        assert!(matches!(result, Err(ExtractionError::SafetyBlock { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_safety_retry(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractionError::Transport("connection refused".into())) }
        })
        .await;

        assert!(matches!(result, Err(ExtractionError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
