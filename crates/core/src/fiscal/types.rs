//! Financial year types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{FinancialYearId, SchemeId};

use crate::accounts::FundType;

/// A scheme's accounting year, carrying the opening balance of each fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialYear {
    /// Unique identifier.
    pub id: FinancialYearId,
    /// Owning scheme.
    pub scheme_id: SchemeId,
    /// Label such as "FY2026".
    pub year_label: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year.
    pub end_date: NaiveDate,
    /// Administrative fund balance brought forward.
    pub admin_opening_balance: Decimal,
    /// Capital works fund balance brought forward.
    pub capital_opening_balance: Decimal,
    /// At most one year per scheme is current.
    pub is_current: bool,
}

impl FinancialYear {
    /// Returns true if `date` falls within the year, both ends inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Returns true if the year's range clashes with `[start, end]`.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        periods_overlap(self.start_date, self.end_date, start, end)
    }

    /// Opening balance brought forward for `fund`.
    #[must_use]
    pub const fn opening_balance(&self, fund: FundType) -> Decimal {
        match fund {
            FundType::Admin => self.admin_opening_balance,
            FundType::CapitalWorks => self.capital_opening_balance,
        }
    }
}

/// Two ranges clash when each starts before the other ends.
///
/// Ranges that merely touch (`end_a == start_b`) do not clash.
#[must_use]
pub fn periods_overlap(
    start_a: NaiveDate,
    end_a: NaiveDate,
    start_b: NaiveDate,
    end_b: NaiveDate,
) -> bool {
    start_a < end_b && end_a > start_b
}

/// Input for creating a financial year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFinancialYear {
    /// Label such as "FY2026".
    pub year_label: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year.
    pub end_date: NaiveDate,
    /// Administrative fund opening balance.
    pub admin_opening_balance: Decimal,
    /// Capital works fund opening balance.
    pub capital_opening_balance: Decimal,
    /// Request that the new year become current.
    pub is_current: bool,
}

/// Partial update of a financial year. Currency is changed through
/// `set_current`, never here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialYearChanges {
    /// New label.
    pub year_label: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// New administrative opening balance.
    pub admin_opening_balance: Option<Decimal>,
    /// New capital works opening balance.
    pub capital_opening_balance: Option<Decimal>,
}

/// How a new year affects which year is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePlan {
    /// Whether the new year is stored as current.
    pub is_current: bool,
    /// The previously current year to clear, if any.
    pub unset_current: Option<FinancialYearId>,
}

/// The writes needed to move the current marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentSwitch {
    /// Year losing the marker, if any and if different from the target.
    pub unset: Option<FinancialYearId>,
    /// Year gaining the marker.
    pub set: FinancialYearId,
}
