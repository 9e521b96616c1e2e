//! Chart of accounts.
//!
//! Organisation-wide default accounts, optionally overridden per scheme,
//! with the rules for creating, editing and retiring accounts.

pub mod chart;
pub mod error;
pub mod seed;
pub mod types;

pub use chart::{ChartService, EffectiveChart};
pub use error::ChartError;
pub use seed::{DEFAULT_CHART, DefaultAccount};
pub use types::{
    Account, AccountChanges, AccountReference, AccountType, FundType, NewAccount,
};
