//! deedcheck - real-estate transaction document verification.
//!
//! Pages of a contract, disclosure statement or equipment list are sent to a
//! vision-capable model, its JSON answer is normalised into typed findings,
//! and deterministic rule checks run over the extracted fields. A disclosure
//! draft can also be cross-checked against evidence such as the title
//! register or cadastral maps.

pub mod checks;
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod parser;
pub mod render;
pub mod verify;

pub use models::{CheckResult, CheckStatus, DocumentType, Finding, Severity};
pub use verify::{Verifier, VerifyConfig};
