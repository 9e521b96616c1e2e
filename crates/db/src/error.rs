//! Repository error type.
//!
//! Wraps the domain errors of `strata-core` together with database
//! failures, and translates constraint violations the database catches
//! under concurrency into the domain errors the services would have raised.

use sea_orm::{DbErr, SqlErr};
use strata_core::accounts::ChartError;
use strata_core::fiscal::FiscalError;
use strata_core::ledger::LedgerError;
use strata_core::reconciliation::ReconciliationError;
use strata_core::reports::ReportError;
use strata_core::{Classify, ErrorKind};
use strata_shared::AppError;
use strata_shared::types::{InvoiceId, TransactionId};
use thiserror::Error;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Chart of accounts rule violated.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Financial year rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Ledger rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Report could not be produced.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Reconciliation rule violated.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// Invoice not found for the scheme.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Invoice already carries a payment reference.
    #[error("Invoice {invoice_id} is already paid by transaction {transaction_id}")]
    InvoiceAlreadyPaid {
        /// The invoice.
        invoice_id: InvoiceId,
        /// The transaction that paid it.
        transaction_id: TransactionId,
    },

    /// The payment was recorded but the invoice could not be stamped.
    ///
    /// The transaction stands; the invoice must be linked manually.
    #[error(
        "Payment {transaction_id} recorded but invoice {invoice_id} was not stamped: {reason}"
    )]
    PaymentStampFailed {
        /// The invoice left unstamped.
        invoice_id: InvoiceId,
        /// The recorded payment.
        transaction_id: TransactionId,
        /// Why the stamp failed.
        reason: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns the error's classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Chart(e) => e.kind(),
            Self::Fiscal(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Report(e) => e.kind(),
            Self::Reconciliation(e) => e.kind(),
            Self::InvoiceNotFound(_) => ErrorKind::NotFound,
            Self::InvoiceAlreadyPaid { .. } => ErrorKind::Conflict,
            Self::PaymentStampFailed { .. } | Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Chart(e) => e.error_code(),
            Self::Fiscal(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Reconciliation(e) => e.error_code(),
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvoiceAlreadyPaid { .. } => "INVOICE_ALREADY_PAID",
            Self::PaymentStampFailed { .. } => "PAYMENT_STAMP_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::Database(e.to_string()),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}

/// Returns true if `err` reports a violation of the named constraint or index.
pub(crate) fn violates(err: &DbErr, constraint: &str) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => message.contains(constraint),
        _ => err.to_string().contains(constraint),
    }
}
