//! Party sub-ledgers.
//!
//! A party's claim against the business grows with CREDIT entries (purchases,
//! expenses) and shrinks with DEBIT entries (payments). Each currency is its
//! own chain and is never converted here.

use std::collections::BTreeMap;

use mizan_shared::types::{CurrencyCode, PartyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{CurrencyTotals, PartyKind};

/// A registered supplier, customer, or employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party id.
    pub id: PartyId,
    /// Kind of party.
    pub kind: PartyKind,
    /// Display name.
    pub name: String,
}

/// Per-currency position of one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// The party.
    pub party_id: PartyId,
    /// Current balance per currency.
    pub balances: BTreeMap<CurrencyCode, Decimal>,
    /// Credit and debit sums per currency.
    pub totals: BTreeMap<CurrencyCode, CurrencyTotals>,
    /// True when any currency balance is above zero.
    pub has_outstanding_debt: bool,
}

impl AccountSummary {
    /// Builds a summary from cached balances and entry totals.
    #[must_use]
    pub fn new(
        party_id: PartyId,
        balances: BTreeMap<CurrencyCode, Decimal>,
        totals: BTreeMap<CurrencyCode, CurrencyTotals>,
    ) -> Self {
        let has_outstanding_debt = balances.values().any(|balance| *balance > Decimal::ZERO);
        Self {
            party_id,
            balances,
            totals,
            has_outstanding_debt,
        }
    }

    /// Total credited in one currency.
    #[must_use]
    pub fn total_credit(&self, currency: &CurrencyCode) -> Decimal {
        self.totals.get(currency).map_or(Decimal::ZERO, |t| t.credit)
    }

    /// Total debited in one currency.
    #[must_use]
    pub fn total_debit(&self, currency: &CurrencyCode) -> Decimal {
        self.totals.get(currency).map_or(Decimal::ZERO, |t| t.debit)
    }
}
