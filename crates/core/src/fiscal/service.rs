//! Financial year rules: no overlaps, exactly one current year.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use strata_shared::types::{FinancialYearId, has_cent_precision};

use super::error::FiscalError;
use super::types::{CreatePlan, CurrentSwitch, FinancialYear, FinancialYearChanges, NewFinancialYear};

/// Stateless financial year service.
///
/// Every method takes the scheme's existing years so the repository can
/// load them inside the same database transaction that writes the result.
pub struct FinancialYearService;

impl FinancialYearService {
    /// Validates a new year and decides how the current marker moves.
    ///
    /// The first year of a scheme is always current.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank label, an inverted range or
    /// sub-cent opening balances, `DuplicateLabel` for a reused label and
    /// `Overlap` naming the first clashing year.
    pub fn plan_create(
        existing: &[FinancialYear],
        input: &NewFinancialYear,
    ) -> Result<CreatePlan, FiscalError> {
        let label = input.year_label.trim();
        Self::validate_fields(
            label,
            input.start_date,
            input.end_date,
            [input.admin_opening_balance, input.capital_opening_balance],
        )?;

        if existing.iter().any(|y| y.year_label == label) {
            return Err(FiscalError::DuplicateLabel(label.to_string()));
        }
        Self::ensure_no_overlap(existing, input.start_date, input.end_date, None)?;

        let is_current = input.is_current || existing.is_empty();
        let unset_current = if is_current {
            Self::current(existing).map(|y| y.id)
        } else {
            None
        };

        Ok(CreatePlan {
            is_current,
            unset_current,
        })
    }

    /// Validates an update and returns the updated year.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan_create`], excluding the year itself from the
    /// overlap and label checks.
    pub fn apply_update(
        existing: &[FinancialYear],
        year: &FinancialYear,
        changes: &FinancialYearChanges,
    ) -> Result<FinancialYear, FiscalError> {
        let mut updated = year.clone();
        if let Some(label) = &changes.year_label {
            updated.year_label = label.trim().to_string();
        }
        if let Some(start) = changes.start_date {
            updated.start_date = start;
        }
        if let Some(end) = changes.end_date {
            updated.end_date = end;
        }
        if let Some(balance) = changes.admin_opening_balance {
            updated.admin_opening_balance = balance;
        }
        if let Some(balance) = changes.capital_opening_balance {
            updated.capital_opening_balance = balance;
        }

        Self::validate_fields(
            &updated.year_label,
            updated.start_date,
            updated.end_date,
            [updated.admin_opening_balance, updated.capital_opening_balance],
        )?;

        if existing
            .iter()
            .any(|y| y.id != year.id && y.year_label == updated.year_label)
        {
            return Err(FiscalError::DuplicateLabel(updated.year_label));
        }
        Self::ensure_no_overlap(existing, updated.start_date, updated.end_date, Some(year.id))?;

        Ok(updated)
    }

    /// Plans moving the current marker to `target`.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound` if `target` is not one of `existing`.
    pub fn plan_set_current(
        existing: &[FinancialYear],
        target: FinancialYearId,
    ) -> Result<CurrentSwitch, FiscalError> {
        if !existing.iter().any(|y| y.id == target) {
            return Err(FiscalError::YearNotFound(target));
        }
        let unset = Self::current(existing)
            .map(|y| y.id)
            .filter(|id| *id != target);
        Ok(CurrentSwitch { unset, set: target })
    }

    /// The scheme's current year.
    #[must_use]
    pub fn current(existing: &[FinancialYear]) -> Option<&FinancialYear> {
        existing.iter().find(|y| y.is_current)
    }

    /// The year containing `date`.
    ///
    /// When two touching years both contain their shared boundary day, the
    /// later-starting one wins.
    #[must_use]
    pub fn containing(existing: &[FinancialYear], date: NaiveDate) -> Option<&FinancialYear> {
        existing
            .iter()
            .filter(|y| y.contains(date))
            .max_by_key(|y| y.start_date)
    }

    /// Returns the first year clashing with `[start, end]`, ignoring `exclude`.
    #[must_use]
    pub fn find_overlap(
        existing: &[FinancialYear],
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<FinancialYearId>,
    ) -> Option<&FinancialYear> {
        existing
            .iter()
            .filter(|y| Some(y.id) != exclude)
            .find(|y| y.overlaps(start, end))
    }

    fn ensure_no_overlap(
        existing: &[FinancialYear],
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<FinancialYearId>,
    ) -> Result<(), FiscalError> {
        match Self::find_overlap(existing, start, end, exclude) {
            Some(clash) => Err(FiscalError::Overlap {
                year_label: clash.year_label.clone(),
                start,
                end,
            }),
            None => Ok(()),
        }
    }

    fn validate_fields(
        label: &str,
        start: NaiveDate,
        end: NaiveDate,
        balances: [Decimal; 2],
    ) -> Result<(), FiscalError> {
        if label.trim().is_empty() {
            return Err(FiscalError::EmptyLabel);
        }
        if end <= start {
            return Err(FiscalError::InvalidDateRange { start, end });
        }
        if let Some(bad) = balances.into_iter().find(|b| !has_cent_precision(*b)) {
            return Err(FiscalError::ExcessPrecision(bad));
        }
        Ok(())
    }
}
