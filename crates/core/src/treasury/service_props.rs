//! Property-based tests for treasury movements.
//!
//! No withdrawal or transfer may drive a treasury below zero.

use mizan_shared::types::{CurrencyCode, TreasuryId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::TreasuryService;
use super::types::TreasuryInfo;
use crate::ledger::LedgerError;

#[derive(Debug, Clone, Copy)]
enum Movement {
    Deposit(Decimal),
    Withdraw(Decimal),
}

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn movement() -> impl Strategy<Value = Movement> {
    prop_oneof![
        amount().prop_map(Movement::Deposit),
        amount().prop_map(Movement::Withdraw),
    ]
}

fn fresh_treasury() -> TreasuryInfo {
    TreasuryInfo {
        id: TreasuryId::new(),
        is_active: true,
        current_balance: Decimal::ZERO,
        currency: CurrencyCode::parse("LYD").unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random deposit/withdraw sequences never leave the balance negative,
    /// and every refused withdrawal is refused with `InsufficientFunds`.
    #[test]
    fn prop_balance_never_negative(movements in prop::collection::vec(movement(), 1..60)) {
        let mut treasury = fresh_treasury();
        for movement in movements {
            match movement {
                Movement::Deposit(amount) => {
                    prop_assert!(TreasuryService::check_deposit(&treasury, amount).is_ok());
                    treasury.current_balance += amount;
                }
                Movement::Withdraw(amount) => {
                    match TreasuryService::check_withdrawal(&treasury, amount) {
                        Ok(()) => treasury.current_balance -= amount,
                        Err(err) => {
                            prop_assert!(
                                matches!(err, LedgerError::InsufficientFunds { .. }),
                                "unexpected error: {err}"
                            );
                            prop_assert!(amount > treasury.current_balance);
                        }
                    }
                }
            }
            prop_assert!(treasury.current_balance >= Decimal::ZERO);
        }
    }

    /// A transfer is accepted exactly when the source covers it, and never
    /// changes the combined balance.
    #[test]
    fn prop_transfer_conserves_money(
        from_balance in amount(),
        to_balance in amount(),
        transfer in amount(),
    ) {
        let mut from = fresh_treasury();
        from.current_balance = from_balance;
        let mut to = fresh_treasury();
        to.current_balance = to_balance;
        let before = from.current_balance + to.current_balance;

        let accepted = TreasuryService::check_transfer(&from, &to, transfer).is_ok();
        prop_assert_eq!(accepted, transfer <= from_balance);

        if accepted {
            from.current_balance -= transfer;
            to.current_balance += transfer;
        }
        prop_assert_eq!(from.current_balance + to.current_balance, before);
        prop_assert!(from.current_balance >= Decimal::ZERO);
    }
}
