//! Financial year repository.
//!
//! Each write loads the scheme's years with a row lock, lets
//! `FinancialYearService` decide, and applies the result in the same
//! database transaction. The exclusion constraint and the partial unique
//! index on `is_current` back this up when no rows exist yet to lock.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use strata_core::fiscal::{
    FinancialYear, FinancialYearChanges, FinancialYearService, FiscalError, NewFinancialYear,
};
use strata_shared::types::{FinancialYearId, SchemeId};
use tracing::info;

use crate::entities::financial_years;
use crate::error::{RepositoryError, violates};

/// Loads every year of a scheme, locking the rows when `lock` is set.
pub(crate) async fn load_years<C: ConnectionTrait>(
    db: &C,
    scheme_id: SchemeId,
    lock: bool,
) -> Result<Vec<FinancialYear>, DbErr> {
    let mut query = financial_years::Entity::find()
        .filter(financial_years::Column::SchemeId.eq(scheme_id.into_inner()))
        .order_by_desc(financial_years::Column::StartDate);
    if lock {
        query = query.lock_exclusive();
    }
    Ok(query
        .all(db)
        .await?
        .into_iter()
        .map(FinancialYear::from)
        .collect())
}

/// Financial year repository.
#[derive(Debug, Clone)]
pub struct FinancialYearRepository {
    db: DatabaseConnection,
}

impl FinancialYearRepository {
    /// Creates a new financial year repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a financial year. The scheme's first year becomes current.
    ///
    /// # Errors
    ///
    /// Returns `Overlap` naming the clashing year, another fiscal
    /// validation error, or a database error.
    pub async fn create_year(
        &self,
        scheme_id: SchemeId,
        input: NewFinancialYear,
    ) -> Result<FinancialYear, RepositoryError> {
        let txn = self.db.begin().await?;
        let existing = load_years(&txn, scheme_id, true).await?;
        let plan = FinancialYearService::plan_create(&existing, &input)?;

        if let Some(previous) = plan.unset_current {
            set_current_flag(&txn, previous, false).await?;
        }

        let now = Utc::now().fixed_offset();
        let model = financial_years::ActiveModel {
            id: Set(FinancialYearId::new().into_inner()),
            scheme_id: Set(scheme_id.into_inner()),
            year_label: Set(input.year_label.trim().to_string()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            admin_opening_balance: Set(input.admin_opening_balance),
            capital_opening_balance: Set(input.capital_opening_balance),
            is_current: Set(plan.is_current),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = match model.insert(&txn).await {
            Ok(inserted) => inserted,
            Err(err) => {
                drop(txn);
                let requested = (input.year_label.trim(), input.start_date, input.end_date);
                return Err(self.translate_conflict(scheme_id, None, requested, err).await);
            }
        };
        txn.commit().await?;

        let year = FinancialYear::from(inserted);
        info!(
            scheme_id = %scheme_id,
            financial_year_id = %year.id,
            year_label = %year.year_label,
            is_current = year.is_current,
            "Financial year created"
        );
        Ok(year)
    }

    /// Updates a year's label, dates or opening balances.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound`, `Overlap` against the scheme's other years,
    /// another fiscal validation error, or a database error.
    pub async fn update_year(
        &self,
        scheme_id: SchemeId,
        year_id: FinancialYearId,
        changes: FinancialYearChanges,
    ) -> Result<FinancialYear, RepositoryError> {
        let txn = self.db.begin().await?;
        let existing = load_years(&txn, scheme_id, true).await?;
        let year = existing
            .iter()
            .find(|y| y.id == year_id)
            .ok_or(FiscalError::YearNotFound(year_id))?;
        let updated = FinancialYearService::apply_update(&existing, year, &changes)?;

        let active = financial_years::ActiveModel {
            id: Set(year_id.into_inner()),
            year_label: Set(updated.year_label.clone()),
            start_date: Set(updated.start_date),
            end_date: Set(updated.end_date),
            admin_opening_balance: Set(updated.admin_opening_balance),
            capital_opening_balance: Set(updated.capital_opening_balance),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        let saved = match active.update(&txn).await {
            Ok(saved) => saved,
            Err(err) => {
                drop(txn);
                let requested = (
                    updated.year_label.as_str(),
                    updated.start_date,
                    updated.end_date,
                );
                return Err(self
                    .translate_conflict(scheme_id, Some(year_id), requested, err)
                    .await);
            }
        };
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            financial_year_id = %year_id,
            "Financial year updated"
        );
        Ok(FinancialYear::from(saved))
    }

    /// Makes `year_id` the scheme's current year, clearing the previous one
    /// in the same database transaction.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound` or a database error.
    pub async fn set_current(
        &self,
        scheme_id: SchemeId,
        year_id: FinancialYearId,
    ) -> Result<FinancialYear, RepositoryError> {
        let txn = self.db.begin().await?;
        let existing = load_years(&txn, scheme_id, true).await?;
        let switch = FinancialYearService::plan_set_current(&existing, year_id)?;

        if let Some(previous) = switch.unset {
            set_current_flag(&txn, previous, false).await?;
        }
        let saved = set_current_flag(&txn, switch.set, true).await?;
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            financial_year_id = %year_id,
            previous = ?switch.unset,
            "Current financial year changed"
        );
        Ok(saved)
    }

    /// Lists the scheme's years, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_years(
        &self,
        scheme_id: SchemeId,
    ) -> Result<Vec<FinancialYear>, RepositoryError> {
        Ok(load_years(&self.db, scheme_id, false).await?)
    }

    /// Finds one of the scheme's years.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound` or a database error.
    pub async fn find_year(
        &self,
        scheme_id: SchemeId,
        year_id: FinancialYearId,
    ) -> Result<FinancialYear, RepositoryError> {
        financial_years::Entity::find_by_id(year_id.into_inner())
            .filter(financial_years::Column::SchemeId.eq(scheme_id.into_inner()))
            .one(&self.db)
            .await?
            .map(FinancialYear::from)
            .ok_or_else(|| FiscalError::YearNotFound(year_id).into())
    }

    /// The scheme's current year, if it has any years.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_year(
        &self,
        scheme_id: SchemeId,
    ) -> Result<Option<FinancialYear>, RepositoryError> {
        Ok(financial_years::Entity::find()
            .filter(financial_years::Column::SchemeId.eq(scheme_id.into_inner()))
            .filter(financial_years::Column::IsCurrent.eq(true))
            .one(&self.db)
            .await?
            .map(FinancialYear::from))
    }

    /// The year containing `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn year_containing(
        &self,
        scheme_id: SchemeId,
        date: NaiveDate,
    ) -> Result<Option<FinancialYear>, RepositoryError> {
        let years = load_years(&self.db, scheme_id, false).await?;
        Ok(FinancialYearService::containing(&years, date).cloned())
    }

    /// Turns a constraint violation raised by a concurrent writer into the
    /// error the service would have returned had it seen that write.
    async fn translate_conflict(
        &self,
        scheme_id: SchemeId,
        exclude: Option<FinancialYearId>,
        (year_label, start, end): (&str, NaiveDate, NaiveDate),
        err: DbErr,
    ) -> RepositoryError {
        if violates(&err, "uq_financial_years_label") {
            return FiscalError::DuplicateLabel(year_label.to_string()).into();
        }
        if violates(&err, "uq_financial_years_current") {
            return FiscalError::CurrentYearConflict.into();
        }
        if violates(&err, "excl_financial_years_overlap") {
            let years = match load_years(&self.db, scheme_id, false).await {
                Ok(years) => years,
                Err(reload) => return reload.into(),
            };
            let year_label = FinancialYearService::find_overlap(&years, start, end, exclude)
                .map_or_else(|| "(concurrent)".to_string(), |y| y.year_label.clone());
            return FiscalError::Overlap {
                year_label,
                start,
                end,
            }
            .into();
        }
        err.into()
    }
}

async fn set_current_flag<C: ConnectionTrait>(
    db: &C,
    year_id: FinancialYearId,
    is_current: bool,
) -> Result<FinancialYear, DbErr> {
    let active = financial_years::ActiveModel {
        id: Set(year_id.into_inner()),
        is_current: Set(is_current),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    Ok(FinancialYear::from(active.update(db).await?))
}
