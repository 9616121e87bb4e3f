//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to currency's decimal places
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Decimal {
    round_amount(amount * rate, decimal_places)
}

/// Rounds an amount to `decimal_places` with banker's rounding and pads the
/// scale so `10` and `10.00` print alike.
#[must_use]
pub fn round_amount(amount: Decimal, decimal_places: u32) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(decimal_places);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_amount() {
        // 100 USD * 15000 = 1,500,000 IDR
        let result = convert_amount(dec!(100), dec!(15000), 0);
        assert_eq!(result, dec!(1500000));
    }

    #[test]
    fn test_convert_with_rounding() {
        // 100.50 USD * 15000.5 = 1,507,550.25 IDR -> rounds to 1,507,550
        let result = convert_amount(dec!(100.50), dec!(15000.5), 0);
        assert_eq!(result, dec!(1507550));
    }

    #[test]
    fn test_bankers_rounding() {
        // 2.5 rounds to 2, 3.5 rounds to 4
        assert_eq!(convert_amount(dec!(1), dec!(2.5), 0), dec!(2));
        assert_eq!(convert_amount(dec!(1), dec!(3.5), 0), dec!(4));
    }

    #[test]
    fn test_round_amount_pads_scale() {
        let rounded = round_amount(dec!(10), 2);
        assert_eq!(rounded.to_string(), "10.00");
        assert_eq!(round_amount(dec!(5.66666), 4), dec!(5.6667));
    }
}
