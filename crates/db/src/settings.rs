//! Ledger settings resolved from configuration.

use mizan_shared::types::CurrencyCode;
use mizan_shared::{AppError, AppResult, ExpenseLedgerMode, LedgerConfig, ReversalPolicy};

/// Settings every settlement repository reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Currency treasury balances are kept in.
    pub base_currency: CurrencyCode,
    /// Whether orphaned treasury withdrawals get a compensating credit.
    pub reversal_policy: ReversalPolicy,
    /// Whether expense claims are booked inside or after the main unit.
    pub expense_ledger_mode: ExpenseLedgerMode,
}

impl LedgerSettings {
    /// Resolves settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidSetting` if the base currency is not a
    /// valid code.
    pub fn from_config(config: &LedgerConfig) -> AppResult<Self> {
        Ok(Self {
            base_currency: CurrencyCode::parse(&config.base_currency)
                .map_err(|message| AppError::invalid_setting("ledger.base_currency", message))?,
            reversal_policy: config.reversal_policy,
            expense_ledger_mode: config.expense_ledger_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let settings = LedgerSettings::from_config(&LedgerConfig::default()).unwrap();
        assert_eq!(settings.base_currency.as_str(), "LYD");
        assert_eq!(settings.reversal_policy, ReversalPolicy::Legacy);
        assert_eq!(settings.expense_ledger_mode, ExpenseLedgerMode::Deferred);
    }

    #[test]
    fn test_invalid_base_currency() {
        let config = LedgerConfig {
            base_currency: "dinar".to_string(),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            LedgerSettings::from_config(&config),
            Err(AppError::InvalidSetting {
                key: "ledger.base_currency",
                ..
            })
        ));
    }
}
