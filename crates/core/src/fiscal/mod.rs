//! Financial years.
//!
//! Each scheme keeps non-overlapping financial years with per-fund opening
//! balances, exactly one of which is current once any exist.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::FiscalError;
pub use service::FinancialYearService;
pub use types::{
    CreatePlan, CurrentSwitch, FinancialYear, FinancialYearChanges, NewFinancialYear,
    periods_overlap,
};
