//! Currency service for conversion to the base currency.

use mizan_shared::types::CurrencyCode;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::LedgerError;

/// Fractional digits kept on converted base-currency amounts.
pub const BASE_DECIMAL_PLACES: u32 = 4;

/// Fractional digits kept on exchange rates.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// Currency service for conversion operations.
///
/// All rounding uses Banker's Rounding (`MidpointNearestEven`).
pub struct CurrencyService;

impl CurrencyService {
    /// Converts `amount` with `rate`, rounded to 4 decimal places.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use mizan_core::currency::CurrencyService;
    ///
    /// let result = CurrencyService::convert(dec!(100), dec!(4.85)).unwrap();
    /// assert_eq!(result, dec!(485.0000));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a validation error if the product leaves the decimal range.
    pub fn convert(amount: Decimal, rate: Decimal) -> Result<Decimal, LedgerError> {
        amount
            .checked_mul(rate)
            .map(|value| Self::round(value, BASE_DECIMAL_PLACES))
            .ok_or_else(LedgerError::out_of_range)
    }

    /// Rounds a value using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Checks that a rate is positive and normalises it to 6 decimal places.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the rate is zero or negative, or rounds
    /// to zero.
    pub fn validate_rate(rate: Decimal) -> Result<Decimal, LedgerError> {
        let rounded = Self::round(rate, RATE_DECIMAL_PLACES);
        if rounded <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Exchange rate must be positive, got {rate}"
            )));
        }
        Ok(rounded)
    }

    /// Converts a foreign amount to the base currency.
    ///
    /// An amount already in the base currency is returned as-is and the rate
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a foreign amount comes with a
    /// non-positive rate.
    pub fn to_base(
        amount: Decimal,
        currency: &CurrencyCode,
        base: &CurrencyCode,
        rate: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if currency == base {
            return Ok(amount);
        }
        let rate = Self::validate_rate(rate)?;
        Self::convert(amount, rate)
    }

    /// The rate to store for a new amount: 1 in the base currency, otherwise
    /// the supplied rate, which is then required.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a foreign currency without a positive
    /// rate.
    pub fn effective_rate(
        currency: &CurrencyCode,
        base: &CurrencyCode,
        rate: Option<Decimal>,
    ) -> Result<Decimal, LedgerError> {
        if currency == base {
            return Ok(Decimal::ONE);
        }
        match rate {
            Some(rate) => Self::validate_rate(rate),
            None => Err(LedgerError::validation(format!(
                "Exchange rate required for {currency} (base is {base})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_convert_rounds_to_4_decimals() {
        // 100 * 1.23456789 = 123.456789
        assert_eq!(
            CurrencyService::convert(dec!(100), dec!(1.23456789)).unwrap(),
            dec!(123.4568)
        );
    }

    #[test]
    fn test_convert_overflow_is_validation_error() {
        assert!(matches!(
            CurrencyService::convert(Decimal::MAX, dec!(2)),
            Err(LedgerError::Validation(_))
        ));
    }

    #[rstest]
    #[case(dec!(2.5), 0, dec!(2))]
    #[case(dec!(3.5), 0, dec!(4))]
    #[case(dec!(2.25), 1, dec!(2.2))]
    #[case(dec!(2.35), 1, dec!(2.4))]
    fn test_bankers_rounding(#[case] value: Decimal, #[case] dp: u32, #[case] expected: Decimal) {
        assert_eq!(CurrencyService::round(value, dp), expected);
    }

    #[test]
    fn test_to_base_same_currency_ignores_rate() {
        let lyd = code("LYD");
        let result = CurrencyService::to_base(dec!(200), &lyd, &lyd, Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(200));
    }

    #[test]
    fn test_to_base_foreign_currency() {
        let result =
            CurrencyService::to_base(dec!(200), &code("USD"), &code("LYD"), dec!(4.8525)).unwrap();
        assert_eq!(result, dec!(970.5000));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1.5))]
    #[case(dec!(0.0000001))]
    fn test_to_base_rejects_bad_rates(#[case] rate: Decimal) {
        let err = CurrencyService::to_base(dec!(10), &code("EUR"), &code("LYD"), rate).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_effective_rate() {
        let lyd = code("LYD");
        let usd = code("USD");
        assert_eq!(
            CurrencyService::effective_rate(&lyd, &lyd, Some(dec!(9))).unwrap(),
            Decimal::ONE
        );
        assert_eq!(
            CurrencyService::effective_rate(&usd, &lyd, Some(dec!(4.8512345))).unwrap(),
            dec!(4.851234)
        );
        assert!(CurrencyService::effective_rate(&usd, &lyd, None).is_err());
    }
}
