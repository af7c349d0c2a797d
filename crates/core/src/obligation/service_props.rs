//! Property-based tests for the installment rules.
//!
//! The sum of installments never exceeds the total, and an obligation is
//! `PAID` exactly when that sum reaches the total within 0.01.

use mizan_shared::types::ObligationId;
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use super::service::{ObligationService, SETTLEMENT_EPSILON};
use super::types::{ObligationState, ObligationStatus};
use crate::ledger::LedgerError;

fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (1i64..max).prop_map(|c| Decimal::new(c, 2))
}

#[derive(Debug, Clone)]
enum Step {
    Pay(Decimal),
    /// Delete the installment at this position (modulo the current count).
    Delete(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => cents(50_000).prop_map(Step::Pay),
        1 => any::<usize>().prop_map(Step::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_installments_bounded_and_status_consistent(
        total in cents(100_000),
        steps in prop::collection::vec(step(), 1..40),
    ) {
        let mut installments: Vec<Decimal> = Vec::new();
        let mut state = ObligationState {
            id: ObligationId::new(),
            status: ObligationStatus::Pending,
            total_amount: total,
            paid: Decimal::ZERO,
        };

        for step in steps {
            match step {
                Step::Pay(amount) => match ObligationService::plan_installment(&state, amount) {
                    Ok(plan) => {
                        installments.push(amount);
                        state.paid = plan.paid;
                        state.status = plan.status;
                    }
                    Err(LedgerError::Overpayment { remaining, .. }) => {
                        prop_assert!(amount > remaining);
                    }
                    Err(LedgerError::InvalidState(_)) => {
                        prop_assert_eq!(state.status, ObligationStatus::Paid);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                },
                Step::Delete(index) => {
                    if installments.is_empty() {
                        continue;
                    }
                    let amount = installments.remove(index % installments.len());
                    state.status = ObligationService::status_after_removal(&state, amount).unwrap();
                    state.paid -= amount;
                }
            }

            let sum: Decimal = installments.iter().sum();
            prop_assert_eq!(sum, state.paid);
            prop_assert!(sum <= total);
            prop_assert_eq!(
                state.status == ObligationStatus::Paid,
                sum >= total - SETTLEMENT_EPSILON
            );
        }
    }

    /// Paying the full remainder always settles the obligation.
    #[test]
    fn prop_full_payment_settles(total in cents(100_000), paid_share in 0u32..100) {
        let paid = (total * Decimal::from(paid_share) / Decimal::from(100))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let state = ObligationState {
            id: ObligationId::new(),
            status: ObligationStatus::Pending,
            total_amount: total,
            paid,
        };
        let plan = ObligationService::plan_full_payment(&state).unwrap();
        prop_assert_eq!(plan.paid, total);
        prop_assert_eq!(plan.status, ObligationStatus::Paid);
    }
}
