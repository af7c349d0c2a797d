//! Property-based tests for base-currency conversion.

use mizan_shared::types::CurrencyCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::CurrencyService;

/// Positive amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive rates from 0.0001 to 10000.0000.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converted amounts never carry more than 4 decimal places.
    #[test]
    fn prop_convert_rounds_to_4_decimals(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = CurrencyService::convert(amount, rate).unwrap();
        prop_assert!(result.scale() <= 4);
    }

    /// Rounding never moves the result by more than half a unit in the last place.
    #[test]
    fn prop_convert_error_is_bounded(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let exact = amount * rate;
        let rounded = CurrencyService::convert(amount, rate).unwrap();
        prop_assert!((exact - rounded).abs() <= Decimal::new(5, 5));
    }

    /// A rate of one is the identity for amounts with at most 4 decimals.
    #[test]
    fn prop_unit_rate_is_identity(amount in positive_amount()) {
        prop_assert_eq!(CurrencyService::convert(amount, Decimal::ONE).unwrap(), amount);
    }

    /// Base-currency amounts pass through untouched whatever the rate.
    #[test]
    fn prop_base_currency_passthrough(
        amount in positive_amount(),
        rate in any::<i64>().prop_map(|v| Decimal::new(v, 4)),
    ) {
        let lyd = CurrencyCode::parse("LYD").unwrap();
        prop_assert_eq!(CurrencyService::to_base(amount, &lyd, &lyd, rate).unwrap(), amount);
    }

    /// Conversion preserves order for a fixed rate.
    #[test]
    fn prop_convert_is_monotonic(
        a in positive_amount(),
        b in positive_amount(),
        rate in positive_rate(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = CurrencyService::convert(low, rate).unwrap();
        let high = CurrencyService::convert(high, rate).unwrap();
        prop_assert!(low <= high);
    }
}
