//! Application-wide error types.
//!
//! Every domain error in the ledger maps onto one of these variants at the
//! call boundary. The message carried by each variant is safe to show to an
//! operator.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The record is frozen (system account, reconciled statement or transaction).
    #[error("Record is immutable: {0}")]
    ImmutableRecord(String),

    /// A financial year date range clashes with an existing one.
    #[error("Period overlap: {0}")]
    Overlap(String),

    /// The record is still referenced and cannot be removed.
    #[error("Record in use: {0}")]
    ReferentialIntegrity(String),

    /// Debits and credits disagree. Never corrected automatically.
    #[error("Ledger imbalance: {0}")]
    Imbalance(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (e.g., duplicate entry or concurrent claim).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Overlap(_) | Self::ReferentialIntegrity(_) | Self::Conflict(_) => 409,
            Self::ImmutableRecord(_) => 422,
            Self::Imbalance(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ImmutableRecord(_) => "IMMUTABLE_RECORD",
            Self::Overlap(_) => "PERIOD_OVERLAP",
            Self::ReferentialIntegrity(_) => "REFERENTIAL_INTEGRITY",
            Self::Imbalance(_) => "LEDGER_IMBALANCE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the error indicates corrupted ledger data that needs
    /// operator attention rather than a corrected request.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Imbalance(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
