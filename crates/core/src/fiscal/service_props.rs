//! Property-based tests for financial year overlap rules.
//!
//! - Overlap is symmetric.
//! - A plan accepted against a set of years never clashes with any of them.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_shared::types::{FinancialYearId, SchemeId};

use super::service::FinancialYearService;
use super::types::{FinancialYear, NewFinancialYear, periods_overlap};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Strategy to generate a (start, end) pair with end after start.
fn range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0u64..2000, 1u64..400).prop_map(|(offset, len)| {
        let start = base() + Days::new(offset);
        (start, start + Days::new(len))
    })
}

proptest! {
    #[test]
    fn prop_overlap_is_symmetric(a in range(), b in range()) {
        prop_assert_eq!(
            periods_overlap(a.0, a.1, b.0, b.1),
            periods_overlap(b.0, b.1, a.0, a.1)
        );
    }

    #[test]
    fn prop_range_overlaps_itself(a in range()) {
        prop_assert!(periods_overlap(a.0, a.1, a.0, a.1));
    }

    #[test]
    fn prop_accepted_years_never_overlap(ranges in prop::collection::vec(range(), 1..12)) {
        let scheme_id = SchemeId::new();
        let mut years: Vec<FinancialYear> = Vec::new();

        for (i, (start, end)) in ranges.into_iter().enumerate() {
            let input = NewFinancialYear {
                year_label: format!("Y{i}"),
                start_date: start,
                end_date: end,
                admin_opening_balance: Decimal::ZERO,
                capital_opening_balance: Decimal::ZERO,
                is_current: i % 3 == 0,
            };
            if let Ok(plan) = FinancialYearService::plan_create(&years, &input) {
                if let Some(prev) = plan.unset_current {
                    for y in &mut years {
                        if y.id == prev {
                            y.is_current = false;
                        }
                    }
                }
                years.push(FinancialYear {
                    id: FinancialYearId::new(),
                    scheme_id,
                    year_label: input.year_label,
                    start_date: start,
                    end_date: end,
                    admin_opening_balance: Decimal::ZERO,
                    capital_opening_balance: Decimal::ZERO,
                    is_current: plan.is_current,
                });
            }
        }

        for (i, a) in years.iter().enumerate() {
            for b in years.iter().skip(i + 1) {
                prop_assert!(!a.overlaps(b.start_date, b.end_date));
            }
        }
        prop_assert_eq!(years.iter().filter(|y| y.is_current).count(), 1);
    }
}
