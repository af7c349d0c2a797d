//! Base-currency conversion.
//!
//! Rates are supplied by the caller at the time cash actually moves; this
//! module never looks them up.

pub mod service;

#[cfg(test)]
mod props;

pub use service::{CurrencyService, BASE_DECIMAL_PLACES, RATE_DECIMAL_PLACES};
