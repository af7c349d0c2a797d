//! Obligation state machine.
//!
//! Every function here is pure. The caller holds the obligation row lock
//! while it reads the paid sum, asks for a plan, and writes the result.

use mizan_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use super::types::{InstallmentPlan, NewObligation, ObligationState, ObligationStatus, RateRebind};
use crate::currency::CurrencyService;
use crate::ledger::LedgerError;

/// Tolerance for treating an obligation as fully paid: 0.01.
pub const SETTLEMENT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Stateless obligation rules.
pub struct ObligationService;

impl ObligationService {
    /// Validates a new obligation and returns the rate to store.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, a claim without
    /// a party, or a foreign currency without a positive rate.
    pub fn validate_new(input: &NewObligation, base: &CurrencyCode) -> Result<Decimal, LedgerError> {
        if input.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Obligation amount must be positive, got {}",
                input.amount
            )));
        }
        if input.record_claim && input.party_id.is_none() {
            return Err(LedgerError::validation(
                "Recording a claim requires a party",
            ));
        }
        CurrencyService::effective_rate(&input.currency, base, input.exchange_rate)
    }

    /// Amount still owed, never negative.
    #[must_use]
    pub fn remaining(total_amount: Decimal, paid: Decimal) -> Decimal {
        (total_amount - paid).max(Decimal::ZERO)
    }

    /// Status implied by the paid sum for an obligation that is not cancelled.
    #[must_use]
    pub fn status_for(total_amount: Decimal, paid: Decimal) -> ObligationStatus {
        if paid >= total_amount - SETTLEMENT_EPSILON {
            ObligationStatus::Paid
        } else {
            ObligationStatus::Pending
        }
    }

    /// Validates an installment against the locked obligation.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the obligation is `PENDING`
    /// - `Validation` for a non-positive amount
    /// - `Overpayment` when the amount exceeds what is still owed
    pub fn plan_installment(
        state: &ObligationState,
        amount: Decimal,
    ) -> Result<InstallmentPlan, LedgerError> {
        if state.status != ObligationStatus::Pending {
            return Err(LedgerError::invalid_state(format!(
                "Cannot pay obligation {} in status {}",
                state.id, state.status
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Installment amount must be positive, got {amount}"
            )));
        }

        let remaining = Self::remaining(state.total_amount, state.paid);
        if amount > remaining {
            return Err(LedgerError::Overpayment {
                obligation_id: state.id.into_inner(),
                remaining,
                requested: amount,
            });
        }

        let paid = state.paid + amount;
        Ok(InstallmentPlan {
            amount,
            paid,
            remaining: Self::remaining(state.total_amount, paid),
            status: Self::status_for(state.total_amount, paid),
        })
    }

    /// Plans settling everything still owed in one installment.
    ///
    /// # Errors
    ///
    /// As [`Self::plan_installment`]; an obligation with nothing left to pay
    /// is reported as `InvalidState`.
    pub fn plan_full_payment(state: &ObligationState) -> Result<InstallmentPlan, LedgerError> {
        let remaining = Self::remaining(state.total_amount, state.paid);
        if state.status == ObligationStatus::Pending && remaining <= Decimal::ZERO {
            return Err(LedgerError::invalid_state(format!(
                "Obligation {} has nothing left to pay",
                state.id
            )));
        }
        Self::plan_installment(state, remaining)
    }

    /// Status after removing an installment of `amount`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for a cancelled obligation.
    pub fn status_after_removal(
        state: &ObligationState,
        amount: Decimal,
    ) -> Result<ObligationStatus, LedgerError> {
        if state.status == ObligationStatus::Cancelled {
            return Err(LedgerError::invalid_state(format!(
                "Cannot delete installments of cancelled obligation {}",
                state.id
            )));
        }
        Ok(Self::status_for(state.total_amount, state.paid - amount))
    }

    /// Validates a cancellation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the obligation is `PENDING`, and a
    /// validation error for an empty reason.
    pub fn validate_cancel(state: &ObligationState, reason: &str) -> Result<(), LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::validation("Cancellation reason is required"));
        }
        match state.status {
            ObligationStatus::Pending => Ok(()),
            other => Err(LedgerError::invalid_state(format!(
                "Cannot cancel obligation {} in status {other}",
                state.id
            ))),
        }
    }

    /// Rebinds a foreign obligation to the rate in force when cash moves.
    ///
    /// Returns `None` for base-currency obligations or when no fresh rate is
    /// supplied.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive fresh rate.
    pub fn rebind_rate(
        total_amount: Decimal,
        currency: &CurrencyCode,
        base: &CurrencyCode,
        fresh_rate: Option<Decimal>,
    ) -> Result<Option<RateRebind>, LedgerError> {
        let Some(rate) = fresh_rate else {
            return Ok(None);
        };
        if currency == base {
            return Ok(None);
        }
        let exchange_rate = CurrencyService::validate_rate(rate)?;
        Ok(Some(RateRebind {
            exchange_rate,
            base_amount: CurrencyService::convert(total_amount, exchange_rate)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Reference, ReferenceKind};
    use mizan_shared::types::{ObligationId, PartyId};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn state(total: Decimal, paid: Decimal, status: ObligationStatus) -> ObligationState {
        ObligationState {
            id: ObligationId::new(),
            status,
            total_amount: total,
            paid,
        }
    }

    fn lyd() -> CurrencyCode {
        CurrencyCode::parse("LYD").unwrap()
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut s = state(dec!(500), Decimal::ZERO, ObligationStatus::Pending);

        let first = ObligationService::plan_installment(&s, dec!(200)).unwrap();
        assert_eq!(first.status, ObligationStatus::Pending);
        assert_eq!(first.remaining, dec!(300));

        s.paid = first.paid;
        let second = ObligationService::plan_installment(&s, dec!(300)).unwrap();
        assert_eq!(second.status, ObligationStatus::Paid);
        assert_eq!(second.remaining, Decimal::ZERO);

        s.paid = second.paid;
        s.status = second.status;
        let reverted = ObligationService::status_after_removal(&s, dec!(200)).unwrap();
        assert_eq!(reverted, ObligationStatus::Pending);
        assert_eq!(ObligationService::remaining(s.total_amount, s.paid - dec!(200)), dec!(300));
    }

    #[test]
    fn test_overpayment_rejected() {
        let s = state(dec!(500), Decimal::ZERO, ObligationStatus::Pending);
        let err = ObligationService::plan_installment(&s, dec!(600)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Overpayment { remaining, requested, .. }
                if remaining == dec!(500) && requested == dec!(600)
        ));
    }

    #[test]
    fn test_payment_within_epsilon_settles() {
        let s = state(dec!(100), Decimal::ZERO, ObligationStatus::Pending);
        let plan = ObligationService::plan_installment(&s, dec!(99.995)).unwrap();
        assert_eq!(plan.status, ObligationStatus::Paid);
    }

    #[test]
    fn test_installment_on_closed_obligations() {
        for status in [ObligationStatus::Paid, ObligationStatus::Cancelled] {
            let s = state(dec!(100), Decimal::ZERO, status);
            assert!(matches!(
                ObligationService::plan_installment(&s, dec!(10)),
                Err(LedgerError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_non_positive_installment() {
        let s = state(dec!(100), Decimal::ZERO, ObligationStatus::Pending);
        assert!(matches!(
            ObligationService::plan_installment(&s, Decimal::ZERO),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_full_payment_plan() {
        let s = state(dec!(500), dec!(120), ObligationStatus::Pending);
        let plan = ObligationService::plan_full_payment(&s).unwrap();
        assert_eq!(plan.amount, dec!(380));
        assert_eq!(plan.status, ObligationStatus::Paid);

        let paid = state(dec!(500), dec!(500), ObligationStatus::Paid);
        assert!(ObligationService::plan_full_payment(&paid).is_err());
    }

    #[test]
    fn test_cancel_rules() {
        let pending = state(dec!(100), Decimal::ZERO, ObligationStatus::Pending);
        assert!(ObligationService::validate_cancel(&pending, "duplicate").is_ok());
        assert!(ObligationService::validate_cancel(&pending, " ").is_err());

        let paid = state(dec!(100), dec!(100), ObligationStatus::Paid);
        assert!(matches!(
            ObligationService::validate_cancel(&paid, "late"),
            Err(LedgerError::InvalidState(_))
        ));

        let cancelled = state(dec!(100), Decimal::ZERO, ObligationStatus::Cancelled);
        assert!(ObligationService::status_after_removal(&cancelled, dec!(10)).is_err());
    }

    #[test]
    fn test_validate_new() {
        let mut input = NewObligation {
            party_id: Some(PartyId::new()),
            amount: dec!(500),
            currency: lyd(),
            exchange_rate: None,
            origin: Reference::new(ReferenceKind::Purchase, Uuid::nil()),
            record_claim: true,
        };
        assert_eq!(ObligationService::validate_new(&input, &lyd()).unwrap(), Decimal::ONE);

        input.currency = CurrencyCode::parse("USD").unwrap();
        assert!(ObligationService::validate_new(&input, &lyd()).is_err());
        input.exchange_rate = Some(dec!(4.85));
        assert_eq!(ObligationService::validate_new(&input, &lyd()).unwrap(), dec!(4.85));

        input.party_id = None;
        assert!(ObligationService::validate_new(&input, &lyd()).is_err());
        input.record_claim = false;
        assert!(ObligationService::validate_new(&input, &lyd()).is_ok());

        input.amount = dec!(-1);
        assert!(ObligationService::validate_new(&input, &lyd()).is_err());
    }

    #[test]
    fn test_rebind_rate() {
        let usd = CurrencyCode::parse("USD").unwrap();
        let rebind = ObligationService::rebind_rate(dec!(200), &usd, &lyd(), Some(dec!(5.1)))
            .unwrap()
            .unwrap();
        assert_eq!(rebind.exchange_rate, dec!(5.1));
        assert_eq!(rebind.base_amount, dec!(1020));

        assert!(ObligationService::rebind_rate(dec!(200), &usd, &lyd(), None)
            .unwrap()
            .is_none());
        assert!(ObligationService::rebind_rate(dec!(200), &lyd(), &lyd(), Some(dec!(5)))
            .unwrap()
            .is_none());
        assert!(ObligationService::rebind_rate(dec!(200), &usd, &lyd(), Some(dec!(0))).is_err());
    }
}
