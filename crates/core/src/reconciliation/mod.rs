//! Bank reconciliation.
//!
//! Statement ingestion, automatic matching of bank lines to ledger
//! transactions, manual overrides and finalisation.

pub mod error;
pub mod import;
pub mod matching;
pub mod types;
pub mod workflow;

pub use error::ReconciliationError;
pub use import::{
    AmountColumns, ColumnLayout, ParsedLine, ParsedStatement, SkipReason, SkippedRow,
    StatementParser, parse_date,
};
pub use matching::MatchingEngine;
pub use types::{
    BankStatement, BankStatementLine, IngestStatementInput, LineAmount, MatchCandidate,
    MatchOutcome, MatchProposal, NonLedgerCategory, Reconciliation, ReconciliationStatus,
    ReconciliationSummary, StatementStatus,
};
pub use workflow::{MatchChange, ReconciliationWorkflow};
