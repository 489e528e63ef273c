//! AI extraction adapter.
//!
//! Sends rendered pages plus an instruction to a vision model and returns
//! its raw text, handling safety blocks with a single retry.

pub mod client;
mod error;
mod retry;

pub use client::{
    prompts, GeminiClient, HarmCategory, HttpTransport, LlmConfig, SafetyPolicy, SafetyThreshold,
    TokenBudget, Transport, VisionClient,
};
pub use error::{ExtractionError, FailureKind};
pub use retry::{with_safety_retry, RetryState};
