//! State module for tracking run outcomes
//!
//! # Components
//!
//! - `PdfOutcome`: the result of one PDF request (downloaded, already present, failed)
//! - `FailureKind`: the categories of non-fatal failures counted by the final report

mod failure;
mod pdf_outcome;

// Re-export main types
pub use failure::FailureKind;
pub use pdf_outcome::PdfOutcome;
