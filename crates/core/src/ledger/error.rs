//! Ledger error types for validation and state errors.
//!
//! One taxonomy covers every settlement operation: treasury movements,
//! party postings, installments, and compound transactions all fail with a
//! variant of [`LedgerError`].

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed input (non-positive amount, missing field, bad currency).
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Lookup Errors ==========
    /// Unknown account, obligation, party, company, or document.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The id that was not found.
        id: Uuid,
    },

    // ========== Balance Errors ==========
    /// Withdrawal or transfer would drive a treasury below zero.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account that would be overdrawn.
        account_id: Uuid,
        /// Balance at the time of the request.
        balance: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Installment exceeds what is still owed on the obligation.
    #[error("Payment of {requested} exceeds remaining {remaining} on obligation {obligation_id}")]
    Overpayment {
        /// The obligation being paid.
        obligation_id: Uuid,
        /// Amount still owed.
        remaining: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    // ========== State Errors ==========
    /// Operation not allowed in the record's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Account is deactivated.
    #[error("Account {0} is inactive")]
    InactiveAccount(Uuid),

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(Uuid),

    /// Branch company is not a child of the named parent company.
    #[error("Company {branch_id} is not a branch of company {parent_id}")]
    MismatchedRelationship {
        /// The branch company.
        branch_id: Uuid,
        /// The claimed parent company.
        parent_id: Uuid,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Internal Errors ==========
    /// Stored data that cannot be interpreted.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`LedgerError::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Validation error for arithmetic that leaves the decimal range.
    #[must_use]
    pub fn out_of_range() -> Self {
        Self::validation("Amount out of range")
    }

    /// Shorthand for [`LedgerError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::MismatchedRelationship { .. } => "MISMATCHED_RELATIONSHIP",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::Validation(_) | Self::SameAccount(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } => 404,

            // 409 Conflict - state and concurrency errors
            Self::InvalidState(_) | Self::InactiveAccount(_) | Self::ConcurrentModification => {
                409
            }

            // 422 Unprocessable - business rule violations
            Self::InsufficientFunds { .. }
            | Self::Overpayment { .. }
            | Self::MismatchedRelationship { .. } => 422,

            // 500 Internal Server Error
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
