//! Integer minor-unit representation of currency amounts.
//!
//! Currency columns are persisted as integers scaled by the field precision
//! so range predicates compare exactly inside the database.

use rust_decimal::Decimal;

/// Converts `amount` to minor units at `precision`.
///
/// Returns `None` when the amount carries more decimal places than the
/// precision allows or does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal, precision: u32) -> Option<i64> {
    if amount.round_dp(precision) != amount {
        return None;
    }
    let mut scaled = amount;
    scaled.rescale(precision);
    if scaled.scale() != precision {
        return None;
    }
    i64::try_from(scaled.mantissa()).ok()
}

/// Converts minor units back to a decimal amount with scale `precision`.
#[must_use]
pub fn from_minor_units(units: i64, precision: u32) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(units), precision)
}
