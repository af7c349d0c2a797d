//! Startup error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Errors raised while the application is being configured.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// A loaded setting has an unusable value.
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting {
        /// Dotted configuration key.
        key: &'static str,
        /// What is wrong with the value.
        message: String,
    },
}

impl AppError {
    /// Shorthand for [`AppError::InvalidSetting`].
    pub fn invalid_setting(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_setting_display() {
        let err = AppError::invalid_setting("ledger.base_currency", "expected 3 letters");
        assert_eq!(
            err.to_string(),
            "Invalid setting ledger.base_currency: expected 3 letters"
        );
    }
}
