//! Treasury movement rules.
//!
//! The checks here run after the treasury rows are locked, so the balance
//! they see is the one the movement will be applied to.

use mizan_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use super::types::{NewTreasury, TreasuryInfo, TreasuryKind};
use crate::ledger::LedgerError;

/// Stateless treasury rules.
pub struct TreasuryService;

impl TreasuryService {
    /// Validates a new treasury.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, a `BANK` without a bank
    /// name, or a `COMPANY` without a company id.
    pub fn validate_new(input: &NewTreasury) -> Result<(), LedgerError> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::validation("Treasury name is required"));
        }
        match input.kind {
            TreasuryKind::Bank
                if input
                    .bank_name
                    .as_deref()
                    .is_none_or(|name| name.trim().is_empty()) =>
            {
                Err(LedgerError::validation("Bank treasuries require a bank name"))
            }
            TreasuryKind::Company if input.company_id.is_none() => Err(LedgerError::validation(
                "Company treasuries require a company id",
            )),
            _ => Ok(()),
        }
    }

    /// Checks a deposit.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive amount and `InactiveAccount`
    /// for a deactivated treasury.
    pub fn check_deposit(treasury: &TreasuryInfo, amount: Decimal) -> Result<(), LedgerError> {
        Self::check_amount(amount)?;
        Self::check_active(treasury)
    }

    /// Checks a withdrawal.
    ///
    /// # Errors
    ///
    /// As [`Self::check_deposit`], plus `InsufficientFunds` when the amount
    /// exceeds the current balance.
    pub fn check_withdrawal(treasury: &TreasuryInfo, amount: Decimal) -> Result<(), LedgerError> {
        Self::check_deposit(treasury, amount)?;
        if amount > treasury.current_balance {
            return Err(LedgerError::InsufficientFunds {
                account_id: treasury.id.into_inner(),
                balance: treasury.current_balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Checks a transfer between two treasuries.
    ///
    /// # Errors
    ///
    /// Returns `SameAccount` when both sides are the same treasury, a
    /// validation error when currencies differ, otherwise the withdrawal
    /// checks on `from` and the deposit checks on `to`.
    pub fn check_transfer(
        from: &TreasuryInfo,
        to: &TreasuryInfo,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if from.id == to.id {
            return Err(LedgerError::SameAccount(from.id.into_inner()));
        }
        if from.currency != to.currency {
            return Err(LedgerError::validation(format!(
                "Cannot transfer between {} and {} treasuries",
                from.currency, to.currency
            )));
        }
        Self::check_withdrawal(from, amount)?;
        Self::check_active(to)
    }

    /// Amount `treasury` pays out for an installment of `amount` in
    /// `currency`, worth `base_amount` in `base_currency`.
    ///
    /// A treasury holding the obligation's own currency pays the face amount;
    /// a base-currency treasury pays the base equivalent.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the treasury holds neither currency.
    pub fn payout_amount(
        treasury: &TreasuryInfo,
        currency: &CurrencyCode,
        base_currency: &CurrencyCode,
        amount: Decimal,
        base_amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if treasury.currency == *currency {
            Ok(amount)
        } else if treasury.currency == *base_currency {
            Ok(base_amount)
        } else {
            Err(LedgerError::validation(format!(
                "Treasury {} holds {} and cannot pay an obligation in {currency}",
                treasury.id, treasury.currency
            )))
        }
    }

    fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Amount must be positive, got {amount}"
            )));
        }
        Ok(())
    }

    fn check_active(treasury: &TreasuryInfo) -> Result<(), LedgerError> {
        if treasury.is_active {
            Ok(())
        } else {
            Err(LedgerError::InactiveAccount(treasury.id.into_inner()))
        }
    }
}
