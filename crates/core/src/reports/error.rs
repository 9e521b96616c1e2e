//! Report error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use strata_shared::types::AccountId;
use thiserror::Error;

use crate::error::{Classify, ErrorKind, impl_into_app_error};

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A line references an account missing from the chart.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No financial year given and the scheme has no current year.
    #[error("No current financial year")]
    NoCurrentYear,

    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Trial balance debits and credits disagree.
    #[error("Trial balance does not balance. Debit: {debit}, Credit: {credit}")]
    TrialBalanceImbalance {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },
}

impl Classify for ReportError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) => ErrorKind::Internal,
            Self::NoCurrentYear => ErrorKind::NotFound,
            Self::InvalidDateRange { .. } => ErrorKind::Validation,
            Self::TrialBalanceImbalance { .. } => ErrorKind::Imbalance,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NoCurrentYear => "NO_CURRENT_YEAR",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::TrialBalanceImbalance { .. } => "LEDGER_IMBALANCE",
        }
    }
}

impl_into_app_error!(ReportError);
