//! Report repository.
//!
//! Loads the posted lines and accounts of one scheme and hands them to
//! [`ReportService`]. Voided transactions never reach the aggregation.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use strata_core::accounts::Account;
use strata_core::fiscal::{FinancialYear, FinancialYearService, FiscalError};
use strata_core::reports::{
    FundBalanceSummary, FundMovement, IncomeStatementReport, PostedLine, ReportError,
    ReportService, TrialBalanceReport,
};
use strata_shared::types::{FinancialYearId, SchemeId};
use tracing::error;

use super::fiscal::load_years;
use crate::entities::{accounts, transaction_lines, transactions};
use crate::error::RepositoryError;

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Generates the trial balance of every account with posted lines.
    ///
    /// An unbalanced result is returned as-is and logged; see
    /// [`Self::checked_trial_balance`] to reject it instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(
        &self,
        scheme_id: SchemeId,
        as_of: Option<NaiveDate>,
    ) -> Result<TrialBalanceReport, RepositoryError> {
        let lines = self.posted_lines(scheme_id, None).await?;
        let accounts = self.visible_accounts(scheme_id).await?;
        let report = ReportService::trial_balance(as_of, &lines, &accounts)?;

        if !report.totals.is_balanced {
            error!(
                scheme_id = %scheme_id,
                total_debit = %report.totals.total_debit,
                total_credit = %report.totals.total_credit,
                "Trial balance does not balance"
            );
        }
        Ok(report)
    }

    /// Generates the trial balance and rejects it when debits and credits
    /// disagree.
    ///
    /// # Errors
    ///
    /// Returns `TrialBalanceImbalance` or a database error.
    pub async fn checked_trial_balance(
        &self,
        scheme_id: SchemeId,
        as_of: Option<NaiveDate>,
    ) -> Result<TrialBalanceReport, RepositoryError> {
        let report = self.trial_balance(scheme_id, as_of).await?;
        ReportService::ensure_balanced(&report)?;
        Ok(report)
    }

    /// Summarises both funds over a financial year, the current one when
    /// `financial_year_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `NoCurrentYear`, `YearNotFound`, or a database error.
    pub async fn fund_balance_summary(
        &self,
        scheme_id: SchemeId,
        financial_year_id: Option<FinancialYearId>,
    ) -> Result<FundBalanceSummary, RepositoryError> {
        let years = load_years(&self.db, scheme_id, false).await?;
        let year: &FinancialYear = match financial_year_id {
            Some(id) => years
                .iter()
                .find(|y| y.id == id)
                .ok_or(FiscalError::YearNotFound(id))?,
            None => FinancialYearService::current(&years).ok_or(ReportError::NoCurrentYear)?,
        };

        let movements: Vec<FundMovement> = transactions::Entity::find()
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .filter(transactions::Column::TransactionDate.gte(year.start_date))
            .filter(transactions::Column::TransactionDate.lte(year.end_date))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|tx| FundMovement {
                transaction_date: tx.transaction_date,
                transaction_type: tx.transaction_type.into(),
                fund_type: tx.fund_type.into(),
                amount: tx.amount,
            })
            .collect();

        Ok(ReportService::fund_balance_summary(year, &movements))
    }

    /// Generates the income statement for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`, or a database error.
    pub async fn income_statement(
        &self,
        scheme_id: SchemeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IncomeStatementReport, RepositoryError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end }.into());
        }
        let lines = self.posted_lines(scheme_id, Some((start, end))).await?;
        let accounts = self.visible_accounts(scheme_id).await?;
        Ok(ReportService::income_statement(start, end, &lines, &accounts)?)
    }

    async fn posted_lines(
        &self,
        scheme_id: SchemeId,
        period: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<PostedLine>, RepositoryError> {
        let mut query = transaction_lines::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null());
        if let Some((start, end)) = period {
            query = query
                .filter(transactions::Column::TransactionDate.gte(start))
                .filter(transactions::Column::TransactionDate.lte(end));
        }

        Ok(query
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(line, tx)| {
                tx.map(|tx| PostedLine {
                    transaction_id: tx.id.into(),
                    transaction_date: tx.transaction_date,
                    fund_type: tx.fund_type.into(),
                    account_id: line.account_id.into(),
                    side: line.side.into(),
                    amount: line.amount,
                })
            })
            .collect())
    }

    /// Every account a line of this scheme may reference, inactive and
    /// shadowed defaults included.
    async fn visible_accounts(&self, scheme_id: SchemeId) -> Result<Vec<Account>, RepositoryError> {
        Ok(accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::SchemeId.is_null())
                    .add(accounts::Column::SchemeId.eq(scheme_id.into_inner())),
            )
            .all(&self.db)
            .await?
            .into_iter()
            .map(Account::from)
            .collect())
    }
}
