//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{CENT, amounts_match, has_cent_precision};
