//! Error taxonomy shared by every ledger module.
//!
//! Each module keeps its own `thiserror` enum. They all classify into an
//! [`ErrorKind`], which is what callers branch on and what decides the
//! [`AppError`] variant at the boundary.

use serde::Serialize;
use strata_shared::AppError;

/// Broad classification of a domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any write.
    Validation,
    /// The record is frozen and cannot change.
    ImmutableRecord,
    /// A date range clashes with an existing financial year.
    Overlap,
    /// The record is still referenced elsewhere.
    ReferentialIntegrity,
    /// Debits and credits disagree.
    Imbalance,
    /// The referenced record does not exist or is not visible.
    NotFound,
    /// A concurrent claim on the same record lost the race.
    Conflict,
    /// Anything the caller cannot fix.
    Internal,
}

impl ErrorKind {
    /// Wraps a message in the matching [`AppError`] variant.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::Validation => AppError::Validation(message),
            Self::ImmutableRecord => AppError::ImmutableRecord(message),
            Self::Overlap => AppError::Overlap(message),
            Self::ReferentialIntegrity => AppError::ReferentialIntegrity(message),
            Self::Imbalance => AppError::Imbalance(message),
            Self::NotFound => AppError::NotFound(message),
            Self::Conflict => AppError::Conflict(message),
            Self::Internal => AppError::Internal(message),
        }
    }
}

/// Implemented by every module error so callers can classify failures
/// without matching on each variant.
pub trait Classify {
    /// Returns the error's classification.
    fn kind(&self) -> ErrorKind;

    /// Returns a stable machine-readable code for the error.
    fn error_code(&self) -> &'static str;
}

/// Implements `From<$error> for AppError` through [`Classify`].
macro_rules! impl_into_app_error {
    ($error:ty) => {
        impl From<$error> for strata_shared::AppError {
            fn from(err: $error) -> Self {
                use $crate::error::Classify;
                err.kind().into_app_error(err.to_string())
            }
        }
    };
}

pub(crate) use impl_into_app_error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_to_app_error() {
        let err = ErrorKind::Overlap.into_app_error("FY2026".to_string());
        assert!(matches!(err, AppError::Overlap(ref m) if m == "FY2026"));
        assert_eq!(err.status_code(), 409);

        let err = ErrorKind::Imbalance.into_app_error("tx".to_string());
        assert!(err.is_fatal());

        let err = ErrorKind::ImmutableRecord.into_app_error("system".to_string());
        assert_eq!(err.error_code(), "IMMUTABLE_RECORD");
    }

    #[test]
    fn test_current_year_race_is_a_conflict() {
        let err = crate::fiscal::FiscalError::CurrentYearConflict;
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "CURRENT_YEAR_CONFLICT");
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }
}
