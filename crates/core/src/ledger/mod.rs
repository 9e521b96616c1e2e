//! Trust ledger.
//!
//! Receipts, payments and journals recorded against one of a scheme's two
//! funds. Every transaction derives exactly one debit and one credit line;
//! stored lines are never edited, only voided with their transaction.

pub mod derivation;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use derivation::{PostingAccounts, calculate_totals, derive_lines, ensure_balanced};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    DerivedLine, JournalAccounts, LineSide, LineTotals, PaymentMethod, PreparedTransaction,
    RecordTransactionInput, Transaction, TransactionFilter, TransactionLine, TransactionType,
};
