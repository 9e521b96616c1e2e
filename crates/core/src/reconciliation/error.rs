//! Reconciliation error types.

use strata_shared::types::{BankStatementId, BankStatementLineId, TransactionId};
use thiserror::Error;

use crate::accounts::FundType;
use crate::error::{Classify, ErrorKind, impl_into_app_error};
use crate::ledger::TransactionType;

/// Errors raised while importing, matching or finalising statements.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    // ========== Import Errors ==========
    /// The uploaded text has no rows.
    #[error("Statement contains no rows")]
    EmptyStatement,

    /// No date column or no amount column could be identified.
    #[error("Unrecognised statement layout: {0}")]
    UnrecognisedLayout(String),

    /// Every row was skipped.
    #[error("No importable lines: {skipped} rows skipped")]
    NoImportableLines {
        /// Number of skipped rows.
        skipped: usize,
    },

    // ========== Lookup Errors ==========
    /// Statement not found for the scheme.
    #[error("Bank statement not found: {0}")]
    StatementNotFound(BankStatementId),

    /// Line not found on the statement.
    #[error("Bank statement line not found: {0}")]
    LineNotFound(BankStatementLineId),

    /// Transaction not found, or voided.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== State Errors ==========
    /// The statement's reconciliation is finalised.
    #[error("Bank statement {0} is reconciled and can no longer change")]
    StatementFinalized(BankStatementId),

    /// Reconciliation already started.
    #[error("Reconciliation already started for statement {0}")]
    AlreadyStarted(BankStatementId),

    /// Line is matched to another transaction; unmatch it first.
    #[error("Line {line_id} is already matched to transaction {transaction_id}")]
    LineAlreadyMatched {
        /// The line.
        line_id: BankStatementLineId,
        /// Its current transaction.
        transaction_id: TransactionId,
    },

    /// Transaction is matched to another line or reconciled elsewhere.
    #[error("Transaction {0} is already matched")]
    TransactionAlreadyMatched(TransactionId),

    /// Line is marked as a non-ledger item; clear the mark first.
    #[error("Line {0} is marked as a non-ledger item")]
    LineMarkedNonLedger(BankStatementLineId),

    /// Line has no match to clear.
    #[error("Line {0} is not matched")]
    LineNotMatched(BankStatementLineId),

    /// Line direction and transaction type disagree.
    #[error("Line {line_id} cannot match a {transaction_type}")]
    IncompatibleTransaction {
        /// The line.
        line_id: BankStatementLineId,
        /// The transaction's type.
        transaction_type: TransactionType,
    },

    /// Transaction belongs to a different fund or scheme than the statement.
    #[error("Transaction {transaction_id} is not in the statement's {statement_fund} fund")]
    FundMismatch {
        /// The transaction.
        transaction_id: TransactionId,
        /// The statement's fund.
        statement_fund: FundType,
    },

    /// Lines remain neither matched nor marked non-ledger.
    #[error("{count} statement lines are unresolved (lines {line_numbers:?})")]
    UnresolvedLines {
        /// Number of unresolved lines.
        count: usize,
        /// Their line numbers.
        line_numbers: Vec<u32>,
    },
}

impl Classify for ReconciliationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyStatement
            | Self::UnrecognisedLayout(_)
            | Self::NoImportableLines { .. }
            | Self::LineNotMatched(_)
            | Self::IncompatibleTransaction { .. }
            | Self::FundMismatch { .. }
            | Self::UnresolvedLines { .. } => ErrorKind::Validation,
            Self::StatementNotFound(_) | Self::LineNotFound(_) | Self::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::StatementFinalized(_) => ErrorKind::ImmutableRecord,
            Self::AlreadyStarted(_)
            | Self::LineAlreadyMatched { .. }
            | Self::TransactionAlreadyMatched(_)
            | Self::LineMarkedNonLedger(_) => ErrorKind::Conflict,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyStatement => "EMPTY_STATEMENT",
            Self::UnrecognisedLayout(_) => "UNRECOGNISED_LAYOUT",
            Self::NoImportableLines { .. } => "NO_IMPORTABLE_LINES",
            Self::StatementNotFound(_) => "STATEMENT_NOT_FOUND",
            Self::LineNotFound(_) => "STATEMENT_LINE_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::StatementFinalized(_) => "STATEMENT_FINALIZED",
            Self::AlreadyStarted(_) => "RECONCILIATION_ALREADY_STARTED",
            Self::LineAlreadyMatched { .. } => "LINE_ALREADY_MATCHED",
            Self::TransactionAlreadyMatched(_) => "TRANSACTION_ALREADY_MATCHED",
            Self::LineMarkedNonLedger(_) => "LINE_MARKED_NON_LEDGER",
            Self::LineNotMatched(_) => "LINE_NOT_MATCHED",
            Self::IncompatibleTransaction { .. } => "INCOMPATIBLE_TRANSACTION",
            Self::FundMismatch { .. } => "FUND_MISMATCH",
            Self::UnresolvedLines { .. } => "UNRESOLVED_LINES",
        }
    }
}

impl_into_app_error!(ReconciliationError);
