//! Bank reconciliation domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{
    BankStatementId, BankStatementLineId, ReconciliationId, SchemeId, TransactionId,
};

use crate::accounts::FundType;
use crate::ledger::TransactionType;

/// Lifecycle of a bank statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Stored, lines not yet parsed.
    Uploaded,
    /// Lines parsed and stored.
    LinesImported,
    /// A reconciliation has been started.
    InProgress,
    /// Finalised. Terminal.
    Reconciled,
}

/// Status of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Lines are still being matched.
    InProgress,
    /// Finalised. Terminal.
    Reconciled,
}

impl ReconciliationStatus {
    /// Returns the snake_case storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Reconciled => "reconciled",
        }
    }
}

/// Why a bank line has no ledger counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonLedgerCategory {
    /// Bank fee or charge.
    BankFee,
    /// Interest credited by the bank.
    Interest,
    /// Anything else the operator accepts as outside the ledger.
    Other,
}

impl NonLedgerCategory {
    /// Returns the snake_case storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BankFee => "bank_fee",
            Self::Interest => "interest",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NonLedgerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NonLedgerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_fee" => Ok(Self::BankFee),
            "interest" => Ok(Self::Interest),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown non-ledger category: {other}")),
        }
    }
}

/// Money movement of a bank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", content = "amount", rename_all = "lowercase")]
pub enum LineAmount {
    /// Money out of the account.
    Debit(Decimal),
    /// Money into the account.
    Credit(Decimal),
}

impl LineAmount {
    /// Builds the movement from the two stored columns.
    ///
    /// Returns `None` unless exactly one column holds a positive amount.
    #[must_use]
    pub fn from_columns(debit: Option<Decimal>, credit: Option<Decimal>) -> Option<Self> {
        let positive = |v: Option<Decimal>| v.filter(|a| a.is_sign_positive() && !a.is_zero());
        match (positive(debit), positive(credit)) {
            (Some(d), None) => Some(Self::Debit(d)),
            (None, Some(c)) => Some(Self::Credit(c)),
            _ => None,
        }
    }

    /// Splits into `(debit_amount, credit_amount)` columns.
    #[must_use]
    pub const fn columns(self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            Self::Debit(d) => (Some(d), None),
            Self::Credit(c) => (None, Some(c)),
        }
    }

    /// The positive amount moved.
    #[must_use]
    pub const fn value(self) -> Decimal {
        match self {
            Self::Debit(v) | Self::Credit(v) => v,
        }
    }

    /// The ledger transaction type that can explain this movement.
    #[must_use]
    pub const fn expected_transaction_type(self) -> TransactionType {
        match self {
            Self::Debit(_) => TransactionType::Payment,
            Self::Credit(_) => TransactionType::Receipt,
        }
    }
}

/// An uploaded bank statement for one fund's trust account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatement {
    /// Statement ID.
    pub id: BankStatementId,
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Fund whose trust account the statement covers.
    pub fund_type: FundType,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Closing balance.
    pub closing_balance: Decimal,
    /// Number of rows skipped during import.
    pub skipped_rows: u32,
    /// When the lines were stored. `None` while only uploaded.
    pub imported_at: Option<DateTime<Utc>>,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

/// One line of a bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatementLine {
    /// Line ID.
    pub id: BankStatementLineId,
    /// Parent statement.
    pub statement_id: BankStatementId,
    /// Position in the statement, starting at 1.
    pub line_number: u32,
    /// Date the bank applied the movement.
    pub line_date: NaiveDate,
    /// Bank narrative.
    pub description: String,
    /// Money out.
    pub debit_amount: Option<Decimal>,
    /// Money in.
    pub credit_amount: Option<Decimal>,
    /// Running balance reported by the bank.
    pub running_balance: Option<Decimal>,
    /// Linked ledger transaction.
    pub matched_transaction_id: Option<TransactionId>,
    /// Set when the line is accepted as having no ledger counterpart.
    pub non_ledger_category: Option<NonLedgerCategory>,
}

impl BankStatementLine {
    /// The line's movement, `None` if the stored columns are inconsistent.
    #[must_use]
    pub fn amount(&self) -> Option<LineAmount> {
        LineAmount::from_columns(self.debit_amount, self.credit_amount)
    }

    /// Returns true if the line is linked to a transaction.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.matched_transaction_id.is_some()
    }

    /// Returns true if the line no longer blocks finalisation.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.matched_transaction_id.is_some() || self.non_ledger_category.is_some()
    }
}

/// The reconciliation of one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Reconciliation ID.
    pub id: ReconciliationId,
    /// Statement being reconciled.
    pub bank_statement_id: BankStatementId,
    /// Current status.
    pub status: ReconciliationStatus,
    /// Set on finalisation.
    pub reconciled_at: Option<DateTime<Utc>>,
}

impl Reconciliation {
    /// Returns true once finalised.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == ReconciliationStatus::Reconciled
    }
}

/// Input for ingesting a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStatementInput {
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Fund whose trust account the statement covers.
    pub fund_type: FundType,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Decoded delimited text.
    pub raw_text: String,
    /// Opening balance if printed on the statement.
    pub opening_balance: Option<Decimal>,
    /// Closing balance if printed on the statement.
    pub closing_balance: Option<Decimal>,
}

/// An unreconciled, non-voided transaction that may explain a bank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Transaction ID.
    pub transaction_id: TransactionId,
    /// Receipt, payment or journal.
    pub transaction_type: TransactionType,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Gross amount.
    pub amount: Decimal,
}

/// Result of automatic matching for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Exactly one best candidate.
    Proposed {
        /// Proposed transaction.
        transaction_id: TransactionId,
        /// Days between line and transaction.
        day_distance: i64,
    },
    /// Several candidates equally close. Needs manual selection.
    Ambiguous {
        /// The tied candidates.
        transaction_ids: Vec<TransactionId>,
    },
    /// Nothing within the window and tolerance.
    NoCandidate,
}

/// Automatic matching result for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProposal {
    /// The bank line.
    pub line_id: BankStatementLineId,
    /// What matching found.
    pub outcome: MatchOutcome,
}

impl MatchProposal {
    /// The proposed transaction, if the outcome is unambiguous.
    #[must_use]
    pub fn proposed_transaction(&self) -> Option<TransactionId> {
        match self.outcome {
            MatchOutcome::Proposed { transaction_id, .. } => Some(transaction_id),
            _ => None,
        }
    }
}

/// Progress and balance check of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Derived statement state.
    pub status: StatementStatus,
    /// Lines on the statement.
    pub total_lines: usize,
    /// Lines linked to a transaction.
    pub matched_lines: usize,
    /// Lines marked non-ledger.
    pub non_ledger_lines: usize,
    /// Lines still blocking finalisation.
    pub outstanding_lines: usize,
    /// Sum of money out.
    pub total_debits: Decimal,
    /// Sum of money in.
    pub total_credits: Decimal,
    /// `opening + credits - debits`.
    pub expected_closing_balance: Decimal,
    /// `closing - expected_closing`.
    pub balance_difference: Decimal,
}

impl ReconciliationSummary {
    /// True once every line is resolved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.outstanding_lines == 0
    }
}
