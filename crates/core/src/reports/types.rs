//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{AccountId, FinancialYearId, TransactionId};

use crate::accounts::{AccountType, FundType};
use crate::ledger::{LineSide, TransactionType};

/// A ledger line of a non-voided transaction, with the context reports need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    /// Parent transaction.
    pub transaction_id: TransactionId,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Transaction fund.
    pub fund_type: FundType,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: LineSide,
    /// Positive amount.
    pub amount: Decimal,
}

/// Gross amount of a non-voided transaction, for fund movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundMovement {
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Transaction fund.
    pub fund_type: FundType,
    /// Gross amount.
    pub amount: Decimal,
}

/// One trial balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of debit lines.
    pub total_debit: Decimal,
    /// Sum of credit lines.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub balance: Decimal,
}

/// Trial balance rows of one account type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSection {
    /// Account type of every row.
    pub account_type: AccountType,
    /// Rows ordered by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Section debit total.
    pub total_debit: Decimal,
    /// Section credit total.
    pub total_credit: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Lines dated after this are excluded. `None` means all lines.
    pub as_of: Option<NaiveDate>,
    /// Non-empty sections in asset, liability, equity, income, expense order.
    pub sections: Vec<TrialBalanceSection>,
    /// Grand totals.
    pub totals: TrialBalanceTotals,
}

impl TrialBalanceReport {
    /// Finds a row by account code.
    #[must_use]
    pub fn row(&self, code: &str) -> Option<&TrialBalanceRow> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .find(|r| r.code == code)
    }

    /// Number of rows across all sections.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }
}

/// Movement of one fund across a financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalance {
    /// Fund.
    pub fund_type: FundType,
    /// Balance brought forward.
    pub opening_balance: Decimal,
    /// Sum of receipts.
    pub total_receipts: Decimal,
    /// Sum of payments.
    pub total_payments: Decimal,
    /// `opening + receipts - payments`.
    pub closing_balance: Decimal,
}

/// Fund balance summary for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalanceSummary {
    /// Financial year.
    pub financial_year_id: FinancialYearId,
    /// Year label.
    pub year_label: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year.
    pub end_date: NaiveDate,
    /// Administrative fund first, then capital works.
    pub funds: Vec<FundBalance>,
}

impl FundBalanceSummary {
    /// Returns the balance of `fund`.
    #[must_use]
    pub fn fund(&self, fund: FundType) -> Option<&FundBalance> {
        self.funds.iter().find(|f| f.fund_type == fund)
    }
}

/// Total of one income or expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Net amount in the category's normal direction.
    pub amount: Decimal,
}

/// Income statement of one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundIncomeStatement {
    /// Fund.
    pub fund_type: FundType,
    /// Income categories ordered by code.
    pub income: Vec<CategoryTotal>,
    /// Expense categories ordered by code.
    pub expenses: Vec<CategoryTotal>,
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of expenses.
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`.
    pub net: Decimal,
}

/// Combined totals across both funds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementTotals {
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of expenses.
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`.
    pub net: Decimal,
}

/// Income statement for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Funds with income or expense activity.
    pub funds: Vec<FundIncomeStatement>,
    /// Combined totals.
    pub combined: IncomeStatementTotals,
}

impl IncomeStatementReport {
    /// True when the period had no income or expense activity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}

/// A transaction whose stored lines do not balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedTransaction {
    /// Transaction ID.
    pub transaction_id: TransactionId,
    /// Sum of debit lines.
    pub total_debit: Decimal,
    /// Sum of credit lines.
    pub total_credit: Decimal,
}
