//! Account statements.

use std::collections::BTreeMap;

use mizan_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::{AccountRef, Direction, LedgerEntry};

/// Credit and debit sums for one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    /// Sum of CREDIT amounts.
    pub credit: Decimal,
    /// Sum of DEBIT amounts.
    pub debit: Decimal,
    /// `credit - debit`.
    pub net: Decimal,
}

impl CurrencyTotals {
    /// Adds one entry's amount.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a sum leaves the decimal range.
    pub fn add(&mut self, direction: Direction, amount: Decimal) -> Result<(), LedgerError> {
        let sum = match direction {
            Direction::Credit => &mut self.credit,
            Direction::Debit => &mut self.debit,
        };
        *sum = sum.checked_add(amount).ok_or_else(LedgerError::out_of_range)?;
        self.net = self
            .credit
            .checked_sub(self.debit)
            .ok_or_else(LedgerError::out_of_range)?;
        Ok(())
    }
}

/// Ordered entries of an account with per-currency totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// The account.
    pub account: AccountRef,
    /// Entries in creation order.
    pub entries: Vec<LedgerEntry>,
    /// Totals keyed by currency.
    pub totals: BTreeMap<CurrencyCode, CurrencyTotals>,
}

impl Statement {
    /// Builds a statement from entries already in creation order.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a currency total leaves the decimal
    /// range.
    pub fn from_entries(account: AccountRef, entries: Vec<LedgerEntry>) -> Result<Self, LedgerError> {
        let totals = totals_by_currency(&entries)?;
        Ok(Self {
            account,
            entries,
            totals,
        })
    }
}

/// Sums entries per currency.
///
/// # Errors
///
/// Returns a validation error if a sum leaves the decimal range.
pub fn totals_by_currency(
    entries: &[LedgerEntry],
) -> Result<BTreeMap<CurrencyCode, CurrencyTotals>, LedgerError> {
    let mut totals: BTreeMap<CurrencyCode, CurrencyTotals> = BTreeMap::new();
    for entry in entries {
        totals
            .entry(entry.currency.clone())
            .or_default()
            .add(entry.direction, entry.amount)?;
    }
    Ok(totals)
}
