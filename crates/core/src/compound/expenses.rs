//! Landed-cost expenses on an approved purchase.
//!
//! An actual expense is owed to a supplier and becomes a pending obligation.
//! A provisional one only raises the purchase's landed cost.

use mizan_shared::types::{CurrencyCode, PartyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyService;
use crate::document::DocumentStatus;
use crate::ledger::LedgerError;

/// One expense to allocate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// What the expense is for (freight, customs...).
    pub description: String,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// Rate to base currency; ignored for the base currency.
    pub exchange_rate: Option<Decimal>,
    /// Debt-creating when true, cost-only when false.
    pub is_actual_expense: bool,
    /// Supplier owed, required for actual expenses.
    pub supplier_id: Option<PartyId>,
}

/// Running totals of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTotals {
    /// Sum of line totals.
    pub total: Decimal,
    /// Sum of allocated expenses in base currency.
    pub total_expenses: Decimal,
    /// `total + total_expenses`.
    pub final_total: Decimal,
}

/// An expense with its rate and base-currency amount resolved.
#[derive(Debug, Clone)]
pub struct PlannedExpense {
    /// The input.
    pub input: ExpenseInput,
    /// Stored rate.
    pub exchange_rate: Decimal,
    /// Amount in base currency.
    pub base_amount: Decimal,
}

impl PlannedExpense {
    /// Supplier to open an obligation for, when this expense creates debt.
    #[must_use]
    pub fn debt_supplier(&self) -> Option<PartyId> {
        if self.input.is_actual_expense {
            self.input.supplier_id
        } else {
            None
        }
    }
}

/// A validated expense batch.
#[derive(Debug, Clone)]
pub struct ExpensePlan {
    /// Expenses in input order.
    pub expenses: Vec<PlannedExpense>,
    /// Sum of base amounts added to the purchase.
    pub added: Decimal,
    /// Purchase totals after allocation.
    pub totals: PurchaseTotals,
}

/// Validates an expense batch against a purchase and computes new totals.
///
/// # Errors
///
/// - `InvalidState` unless the purchase is `APPROVED` (checked first)
/// - `Validation` for an empty batch, a non-positive amount, an actual expense
///   without a supplier, or a foreign expense without a positive rate
pub fn plan_expenses(
    status: DocumentStatus,
    current: PurchaseTotals,
    expenses: Vec<ExpenseInput>,
    base: &CurrencyCode,
) -> Result<ExpensePlan, LedgerError> {
    if status != DocumentStatus::Approved {
        return Err(LedgerError::invalid_state(format!(
            "Expenses can only be allocated to approved purchases, purchase is {status}"
        )));
    }
    if expenses.is_empty() {
        return Err(LedgerError::validation("At least one expense is required"));
    }

    let mut planned = Vec::with_capacity(expenses.len());
    for (index, input) in expenses.into_iter().enumerate() {
        if input.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Expense {}: amount must be positive",
                index + 1
            )));
        }
        if input.is_actual_expense && input.supplier_id.is_none() {
            return Err(LedgerError::validation(format!(
                "Expense {}: actual expenses require a supplier",
                index + 1
            )));
        }
        let exchange_rate =
            CurrencyService::effective_rate(&input.currency, base, input.exchange_rate)?;
        let base_amount = CurrencyService::to_base(input.amount, &input.currency, base, exchange_rate)?;
        planned.push(PlannedExpense {
            input,
            exchange_rate,
            base_amount,
        });
    }

    let added = planned.iter().try_fold(Decimal::ZERO, |sum, e| {
        sum.checked_add(e.base_amount)
            .ok_or_else(LedgerError::out_of_range)
    })?;
    let total_expenses = current
        .total_expenses
        .checked_add(added)
        .ok_or_else(LedgerError::out_of_range)?;
    let final_total = current
        .total
        .checked_add(total_expenses)
        .ok_or_else(LedgerError::out_of_range)?;
    Ok(ExpensePlan {
        expenses: planned,
        added,
        totals: PurchaseTotals {
            total: current.total,
            total_expenses,
            final_total,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lyd() -> CurrencyCode {
        CurrencyCode::parse("LYD").unwrap()
    }

    fn totals() -> PurchaseTotals {
        PurchaseTotals {
            total: dec!(1000),
            total_expenses: dec!(50),
            final_total: dec!(1050),
        }
    }

    fn expense(amount: Decimal, actual: bool) -> ExpenseInput {
        ExpenseInput {
            description: "Freight".to_string(),
            amount,
            currency: lyd(),
            exchange_rate: None,
            is_actual_expense: actual,
            supplier_id: actual.then(PartyId::new),
        }
    }

    #[test]
    fn test_unapproved_purchase_rejected_first() {
        for status in [DocumentStatus::Draft, DocumentStatus::Cancelled] {
            let err = plan_expenses(status, totals(), Vec::new(), &lyd()).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidState(_)));
        }
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = plan_expenses(DocumentStatus::Approved, totals(), Vec::new(), &lyd()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_actual_expense_requires_supplier() {
        let mut e = expense(dec!(10), true);
        e.supplier_id = None;
        assert!(plan_expenses(DocumentStatus::Approved, totals(), vec![e], &lyd()).is_err());
    }

    #[test]
    fn test_totals_use_base_amounts() {
        let mut usd = expense(dec!(100), true);
        usd.currency = CurrencyCode::parse("USD").unwrap();
        usd.exchange_rate = Some(dec!(4.85));

        let plan = plan_expenses(
            DocumentStatus::Approved,
            totals(),
            vec![usd, expense(dec!(20), false)],
            &lyd(),
        )
        .unwrap();

        assert_eq!(plan.added, dec!(505));
        assert_eq!(plan.totals.total_expenses, dec!(555));
        assert_eq!(plan.totals.final_total, dec!(1555));
        assert!(plan.expenses[0].debt_supplier().is_some());
        assert!(plan.expenses[1].debt_supplier().is_none());
    }

    #[test]
    fn test_oversized_batch_is_validation_error() {
        let err = plan_expenses(
            DocumentStatus::Approved,
            totals(),
            vec![expense(Decimal::MAX, false)],
            &lyd(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_provisional_expense_ignores_supplier() {
        let mut e = expense(dec!(10), false);
        e.supplier_id = Some(PartyId::new());
        let plan = plan_expenses(DocumentStatus::Approved, totals(), vec![e], &lyd()).unwrap();
        assert!(plan.expenses[0].debt_supplier().is_none());
    }
}
