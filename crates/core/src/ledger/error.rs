//! Ledger error types.

use rust_decimal::Decimal;
use strata_shared::types::{AccountId, TransactionId};
use thiserror::Error;

use super::types::TransactionType;
use crate::accounts::{AccountType, FundType};
use crate::error::{Classify, ErrorKind, impl_into_app_error};

/// Errors that can occur while recording or voiding transactions.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Amount Errors ==========
    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Amount has fractions of a cent.
    #[error("Amount must be whole cents: {0}")]
    ExcessPrecision(Decimal),

    /// GST must lie between zero and the gross amount.
    #[error("GST {gst} must be between 0 and the amount {amount}")]
    InvalidGst {
        /// GST component.
        gst: Decimal,
        /// Gross amount.
        amount: Decimal,
    },

    // ========== Shape Errors ==========
    /// Description is blank.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// Receipts and payments need a category.
    #[error("A {0} requires a category account")]
    MissingCategory(TransactionType),

    /// Journals need explicit accounts.
    #[error("A journal requires debit and credit accounts")]
    MissingJournalAccounts,

    /// Journal accounts only apply to journals.
    #[error("Journal accounts are not allowed on a {0}")]
    UnexpectedJournalAccounts(TransactionType),

    /// A journal must move value between two different accounts.
    #[error("Journal debit and credit account must differ: {0}")]
    SameJournalAccount(AccountId),

    // ========== Account Errors ==========
    /// Account not found or not visible to the scheme.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Category has the wrong classification for the transaction type.
    #[error("A {transaction_type} cannot use {actual} account {account_id}: expected {expected}")]
    InvalidCategoryType {
        /// The category account.
        account_id: AccountId,
        /// The transaction type.
        transaction_type: TransactionType,
        /// The required classification.
        expected: AccountType,
        /// The account's classification.
        actual: AccountType,
    },

    /// Account is restricted to the other fund.
    #[error("Account {account_id} belongs to the {account_fund} fund, not {transaction_fund}")]
    FundMismatch {
        /// The account.
        account_id: AccountId,
        /// The account's fund.
        account_fund: FundType,
        /// The transaction's fund.
        transaction_fund: FundType,
    },

    /// The fund's cash-at-bank account is missing from the chart.
    #[error("No trust account for the {0} fund")]
    TrustAccountMissing(FundType),

    // ========== Balance Errors ==========
    /// Derived lines do not balance.
    #[error("Transaction is not balanced. Debit: {debit}, Credit: {credit}")]
    Imbalance {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    // ========== State Errors ==========
    /// Transaction not found, or already voided.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Reconciled transactions are frozen.
    #[error("Transaction {0} is reconciled and cannot be changed")]
    TransactionReconciled(TransactionId),
}

impl Classify for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::NegativeAmount(_)
            | Self::ExcessPrecision(_)
            | Self::InvalidGst { .. }
            | Self::EmptyDescription
            | Self::MissingCategory(_)
            | Self::MissingJournalAccounts
            | Self::UnexpectedJournalAccounts(_)
            | Self::SameJournalAccount(_)
            | Self::AccountInactive(_)
            | Self::InvalidCategoryType { .. }
            | Self::FundMismatch { .. } => ErrorKind::Validation,
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => ErrorKind::NotFound,
            Self::TrustAccountMissing(_) => ErrorKind::Internal,
            Self::Imbalance { .. } => ErrorKind::Imbalance,
            Self::TransactionReconciled(_) => ErrorKind::ImmutableRecord,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::InvalidGst { .. } => "INVALID_GST",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::MissingCategory(_) => "MISSING_CATEGORY",
            Self::MissingJournalAccounts => "MISSING_JOURNAL_ACCOUNTS",
            Self::UnexpectedJournalAccounts(_) => "UNEXPECTED_JOURNAL_ACCOUNTS",
            Self::SameJournalAccount(_) => "SAME_JOURNAL_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidCategoryType { .. } => "INVALID_CATEGORY_TYPE",
            Self::FundMismatch { .. } => "FUND_MISMATCH",
            Self::TrustAccountMissing(_) => "TRUST_ACCOUNT_MISSING",
            Self::Imbalance { .. } => "LEDGER_IMBALANCE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionReconciled(_) => "TRANSACTION_RECONCILED",
        }
    }
}

impl_into_app_error!(LedgerError);
