//! Core business logic for the strata trust ledger.
//!
//! This crate contains pure business logic with no web or database
//! dependencies. Repositories in `strata-db` load rows, hand them to the
//! services here, and persist whatever these services approve.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts, system defaults and per-scheme overrides
//! - `fiscal` - Financial years and the current-year invariant
//! - `ledger` - Receipts, payments and journals with derived double-entry lines
//! - `reports` - Trial balance, fund balance summary, income statement
//! - `reconciliation` - Statement import, matching and finalisation

pub mod accounts;
pub mod error;
pub mod fiscal;
pub mod ledger;
pub mod reconciliation;
pub mod reports;

pub use error::{Classify, ErrorKind};
