//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Trust money is held as `rust_decimal::Decimal` at currency minor-unit
//! precision (two decimal places).

use rust_decimal::Decimal;

/// One cent, the smallest representable trust amount.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns true if the amount carries no precision below one cent.
///
/// Trailing zeros are ignored, so `100.000` is cent-precise but `100.005` is not.
#[must_use]
pub fn has_cent_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

/// Returns true if two amounts are equal to within `tolerance` (exclusive).
#[must_use]
pub fn amounts_match(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() < tolerance
}
