//! Error type returned by every repository.

use mizan_core::LedgerError;
use sea_orm::{DbErr, SqlErr};

/// A domain rule failure or a database failure.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    /// Business rule violation from `mizan-core`.
    #[error(transparent)]
    Domain(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl FinanceError {
    /// Maps a failed ledger insert. A duplicate chain version means another
    /// writer appended first.
    pub(crate) fn on_chain_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                LedgerError::ConcurrentModification.into()
            }
            _ => err.into(),
        }
    }

    /// True when the caller may retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.as_domain().is_some_and(LedgerError::is_retryable)
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Domain(err) => err.http_status_code(),
            Self::Database(_) => 500,
        }
    }

    /// The domain error, if this is one.
    #[must_use]
    pub fn as_domain(&self) -> Option<&LedgerError> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Database(_) => None,
        }
    }
}
