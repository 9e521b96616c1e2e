//! Financial year errors.

use chrono::NaiveDate;
use strata_shared::types::FinancialYearId;
use thiserror::Error;

use crate::error::{Classify, ErrorKind, impl_into_app_error};

/// Errors raised while maintaining financial years.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Financial year not found for the scheme.
    #[error("Financial year not found: {0}")]
    YearNotFound(FinancialYearId),

    /// Label is blank.
    #[error("Financial year label cannot be empty")]
    EmptyLabel,

    /// Another year of the scheme already uses the label.
    #[error("Financial year label '{0}' already exists")]
    DuplicateLabel(String),

    /// End date is not after the start date.
    #[error("Financial year must end after it starts: {start} to {end}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// An opening balance has fractions of a cent.
    #[error("Opening balance must be whole cents: {0}")]
    ExcessPrecision(rust_decimal::Decimal),

    /// The range clashes with an existing year.
    #[error("Dates {start} to {end} overlap financial year {year_label}")]
    Overlap {
        /// Label of the existing year.
        year_label: String,
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// A concurrent change already made another year current.
    #[error("Another financial year became current concurrently")]
    CurrentYearConflict,
}

impl Classify for FiscalError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::YearNotFound(_) => ErrorKind::NotFound,
            Self::EmptyLabel | Self::InvalidDateRange { .. } | Self::ExcessPrecision(_) => {
                ErrorKind::Validation
            }
            Self::DuplicateLabel(_) | Self::CurrentYearConflict => ErrorKind::Conflict,
            Self::Overlap { .. } => ErrorKind::Overlap,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::YearNotFound(_) => "FINANCIAL_YEAR_NOT_FOUND",
            Self::EmptyLabel => "EMPTY_YEAR_LABEL",
            Self::DuplicateLabel(_) => "DUPLICATE_YEAR_LABEL",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::Overlap { .. } => "PERIOD_OVERLAP",
            Self::CurrentYearConflict => "CURRENT_YEAR_CONFLICT",
        }
    }
}

impl_into_app_error!(FiscalError);
