//! Ledger domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{AccountId, SchemeId, TransactionId, TransactionLineId};

use crate::accounts::FundType;

/// Kind of business event recorded against a fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money into the trust account.
    Receipt,
    /// Money out of the trust account.
    Payment,
    /// Reclassification between accounts, no cash movement.
    Journal,
}

impl TransactionType {
    /// Returns the lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Payment => "payment",
            Self::Journal => "journal",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receipt" => Ok(Self::Receipt),
            "payment" => Ok(Self::Payment),
            "journal" => Ok(Self::Journal),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Side of a ledger line.
///
/// Debits increase asset and expense accounts; credits increase liability,
/// equity and income accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSide {
    /// Debit line.
    Debit,
    /// Credit line.
    Credit,
}

impl LineSide {
    /// Returns the lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// How a payment left the trust account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Electronic funds transfer.
    Eft,
    /// BPAY biller payment.
    Bpay,
    /// Cheque.
    Cheque,
    /// Direct debit authority.
    DirectDebit,
    /// Scheme credit card.
    CreditCard,
    /// Cash.
    Cash,
}

impl PaymentMethod {
    /// Returns the snake_case storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eft => "eft",
            Self::Bpay => "bpay",
            Self::Cheque => "cheque",
            Self::DirectDebit => "direct_debit",
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
        }
    }

    /// Parses a free-form method, falling back to `default` when the input is
    /// missing or unrecognised.
    #[must_use]
    pub fn resolve(raw: Option<&str>, default: Self) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(default)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "eft" | "bank_transfer" => Ok(Self::Eft),
            "bpay" => Ok(Self::Bpay),
            "cheque" | "check" => Ok(Self::Cheque),
            "direct_debit" => Ok(Self::DirectDebit),
            "credit_card" | "card" => Ok(Self::CreditCard),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("unknown payment method: {s}")),
        }
    }
}

/// Explicit accounts for a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalAccounts {
    /// Account debited.
    pub debit_account_id: AccountId,
    /// Account credited.
    pub credit_account_id: AccountId,
}

/// Input for recording a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTransactionInput {
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Date of the event.
    pub transaction_date: NaiveDate,
    /// Receipt, payment or journal.
    pub transaction_type: TransactionType,
    /// Fund the money belongs to.
    pub fund_type: FundType,
    /// Income or expense account. Required for receipts and payments.
    pub category_id: Option<AccountId>,
    /// Journal accounts. Required for journals, rejected otherwise.
    pub journal: Option<JournalAccounts>,
    /// Gross amount, strictly positive.
    pub amount: Decimal,
    /// GST component of `amount`.
    pub gst_amount: Decimal,
    /// Narrative.
    pub description: String,
    /// External reference such as an invoice number.
    pub reference: Option<String>,
    /// Payment method, payments only.
    pub payment_method: Option<String>,
}

/// A derived ledger line before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedLine {
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: LineSide,
    /// Positive amount.
    pub amount: Decimal,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    /// Sum of debit lines.
    pub total_debit: Decimal,
    /// Sum of credit lines.
    pub total_credit: Decimal,
    /// Whether the two agree.
    pub is_balanced: bool,
}

/// A validated transaction with its derived lines, ready to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTransaction {
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Date of the event.
    pub transaction_date: NaiveDate,
    /// Receipt, payment or journal.
    pub transaction_type: TransactionType,
    /// Fund the money belongs to.
    pub fund_type: FundType,
    /// Stored category. For journals, the debit account.
    pub category_id: AccountId,
    /// Gross amount.
    pub amount: Decimal,
    /// GST component.
    pub gst_amount: Decimal,
    /// Narrative, trimmed.
    pub description: String,
    /// External reference, blank becomes `None`.
    pub reference: Option<String>,
    /// Set for payments only.
    pub payment_method: Option<PaymentMethod>,
    /// Exactly two balanced lines.
    pub lines: Vec<DerivedLine>,
    /// Line totals.
    pub totals: LineTotals,
}

/// A stored transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Date of the event.
    pub transaction_date: NaiveDate,
    /// Receipt, payment or journal.
    pub transaction_type: TransactionType,
    /// Fund the money belongs to.
    pub fund_type: FundType,
    /// Category account.
    pub category_id: AccountId,
    /// Gross amount.
    pub amount: Decimal,
    /// GST component.
    pub gst_amount: Decimal,
    /// Narrative.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Payment method, payments only.
    pub payment_method: Option<PaymentMethod>,
    /// Set once the bank statement covering it is finalised.
    pub is_reconciled: bool,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns true once the transaction has been voided.
    #[must_use]
    pub const fn is_voided(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A stored ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// Line ID.
    pub id: TransactionLineId,
    /// Parent transaction.
    pub transaction_id: TransactionId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: LineSide,
    /// Positive amount.
    pub amount: Decimal,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Restrict to one fund.
    pub fund_type: Option<FundType>,
    /// Restrict to one type.
    pub transaction_type: Option<TransactionType>,
    /// Earliest date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub to: Option<NaiveDate>,
    /// Restrict to reconciled or unreconciled transactions.
    pub is_reconciled: Option<bool>,
    /// Include voided transactions.
    pub include_voided: bool,
}
