//! Chart of accounts errors.

use strata_shared::types::AccountId;
use thiserror::Error;

use super::types::AccountReference;
use crate::error::{Classify, ErrorKind, impl_into_app_error};

/// Errors raised while maintaining the chart of accounts.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Account not found or not visible to the scheme.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Parent account not found or not visible to the scheme.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// An account cannot be its own parent.
    #[error("Account {0} cannot be its own parent")]
    SelfParent(AccountId),

    /// Code is not a 1 to 10 digit number.
    #[error("Invalid account code '{0}': must be 1 to 10 digits")]
    InvalidCode(String),

    /// Name is blank.
    #[error("Account name cannot be empty")]
    EmptyName,

    /// Another account in the same scope already uses the code.
    #[error("Account code {0} already exists")]
    DuplicateCode(String),

    /// System accounts are seeded and frozen.
    #[error("System account {0} cannot be modified")]
    SystemAccountImmutable(String),

    /// Organisation defaults are shared by every scheme; a scheme overrides
    /// one by creating its own account with the same code.
    #[error("Default account {0} is shared and cannot be changed by a scheme")]
    DefaultAccountReadOnly(String),

    /// Account type is locked once ledger lines exist.
    #[error("Account type of {account_id} cannot change: {line_count} ledger lines exist")]
    AccountTypeLocked {
        /// The account.
        account_id: AccountId,
        /// Number of existing ledger lines.
        line_count: u64,
    },

    /// Account is still referenced.
    #[error("Account {account_id} is referenced by {count} {referenced_by}")]
    AccountInUse {
        /// The account.
        account_id: AccountId,
        /// What references it.
        referenced_by: AccountReference,
        /// How many references exist.
        count: u64,
    },
}

impl Classify for ChartError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) | Self::ParentNotFound(_) => ErrorKind::NotFound,
            Self::SelfParent(_) | Self::InvalidCode(_) | Self::EmptyName => ErrorKind::Validation,
            Self::DuplicateCode(_) => ErrorKind::Conflict,
            Self::SystemAccountImmutable(_)
            | Self::DefaultAccountReadOnly(_)
            | Self::AccountTypeLocked { .. } => ErrorKind::ImmutableRecord,
            Self::AccountInUse { .. } => ErrorKind::ReferentialIntegrity,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_ACCOUNT_NOT_FOUND",
            Self::SelfParent(_) => "ACCOUNT_SELF_PARENT",
            Self::InvalidCode(_) => "INVALID_ACCOUNT_CODE",
            Self::EmptyName => "EMPTY_ACCOUNT_NAME",
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::SystemAccountImmutable(_) => "SYSTEM_ACCOUNT_IMMUTABLE",
            Self::DefaultAccountReadOnly(_) => "DEFAULT_ACCOUNT_READ_ONLY",
            Self::AccountTypeLocked { .. } => "ACCOUNT_TYPE_LOCKED",
            Self::AccountInUse { .. } => "ACCOUNT_IN_USE",
        }
    }
}

impl_into_app_error!(ChartError);
