//! Financial report generation.
//!
//! Derived, read-only views over the ledger:
//! - Trial Balance
//! - Fund Balance Summary
//! - Income Statement
//! - Unbalanced transaction check

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
