//! Ledger domain types.
//!
//! Every balance-changing event is a [`LedgerEntry`] against an
//! [`AccountRef`] in one currency, tagged with the [`Reference`] of the
//! document that caused it.

use chrono::{DateTime, Utc};
use mizan_shared::types::{CurrencyCode, LedgerEntryId, PartyId, TreasuryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::LedgerError;

/// Direction of a ledger entry.
///
/// CREDIT grows the account's balance, DEBIT shrinks it. For a party this is
/// the party's claim against the business; for a treasury it is cash on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Balance increases.
    Credit,
    /// Balance decreases.
    Debit,
}

impl Direction {
    /// Applies this direction to a balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the result leaves the decimal range.
    pub fn apply(self, balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
        match self {
            Self::Credit => balance.checked_add(amount),
            Self::Debit => balance.checked_sub(amount),
        }
        .ok_or_else(LedgerError::out_of_range)
    }

    /// Returns the opposite direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Kind of document an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReferenceKind {
    /// Purchase or expense debt owed to a supplier.
    Purchase,
    /// Payment settling an obligation.
    Payment,
    /// Goods returned against a purchase.
    Return,
    /// Manual or compensating correction.
    Adjustment,
    /// Employee salary.
    Salary,
    /// Employee bonus.
    Bonus,
    /// Cash received for a sale.
    Sale,
    /// Movement between two treasuries.
    Transfer,
    /// Plain cash deposit.
    Deposit,
}

impl ReferenceKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Payment => "PAYMENT",
            Self::Return => "RETURN",
            Self::Adjustment => "ADJUSTMENT",
            Self::Salary => "SALARY",
            Self::Bonus => "BONUS",
            Self::Sale => "SALE",
            Self::Transfer => "TRANSFER",
            Self::Deposit => "DEPOSIT",
        }
    }
}

/// The document an entry was booked for.
///
/// Reversals match entries by `(account, reference)`; there is no other
/// link between an entry and its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// What kind of document.
    pub kind: ReferenceKind,
    /// The document's id.
    pub id: Uuid,
}

impl Reference {
    /// Creates a reference.
    #[must_use]
    pub fn new(kind: ReferenceKind, id: impl Into<Uuid>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Kind of external party holding a sub-ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyKind {
    /// Goods or service supplier.
    Supplier,
    /// Customer.
    Customer,
    /// Employee (salary and bonus).
    Employee,
}

/// A balance holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountRef {
    /// Cash or bank account in the base currency.
    Treasury {
        /// The treasury.
        id: TreasuryId,
    },
    /// Supplier, customer, or employee; balances kept per currency.
    Party {
        /// Kind of party.
        kind: PartyKind,
        /// The party.
        id: PartyId,
    },
}

impl AccountRef {
    /// Account of a treasury.
    #[must_use]
    pub const fn treasury(id: TreasuryId) -> Self {
        Self::Treasury { id }
    }

    /// Account of a party.
    #[must_use]
    pub const fn party(kind: PartyKind, id: PartyId) -> Self {
        Self::Party { kind, id }
    }

    /// Storage discriminator for the account.
    #[must_use]
    pub fn account_kind(&self) -> &'static str {
        match self {
            Self::Treasury { .. } => "treasury",
            Self::Party {
                kind: PartyKind::Supplier,
                ..
            } => "supplier",
            Self::Party {
                kind: PartyKind::Customer,
                ..
            } => "customer",
            Self::Party {
                kind: PartyKind::Employee,
                ..
            } => "employee",
        }
    }

    /// The underlying id.
    #[must_use]
    pub fn account_id(&self) -> Uuid {
        match self {
            Self::Treasury { id } => id.into_inner(),
            Self::Party { id, .. } => id.into_inner(),
        }
    }

    /// Rebuilds an account from its stored discriminator and id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown discriminator.
    pub fn from_parts(account_kind: &str, account_id: Uuid) -> Result<Self, LedgerError> {
        match account_kind {
            "treasury" => Ok(Self::treasury(TreasuryId::from_uuid(account_id))),
            "supplier" => Ok(Self::party(PartyKind::Supplier, account_id.into())),
            "customer" => Ok(Self::party(PartyKind::Customer, account_id.into())),
            "employee" => Ok(Self::party(PartyKind::Employee, account_id.into())),
            other => Err(LedgerError::validation(format!(
                "Unknown account kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.account_kind(), self.account_id())
    }
}

/// Input for appending one ledger entry.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// Account to post to.
    pub account: AccountRef,
    /// CREDIT or DEBIT.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// Owning document.
    pub reference: Reference,
    /// Free-text description.
    pub description: String,
    /// Acting user, if known.
    pub created_by: Option<UserId>,
}

impl NewLedgerEntry {
    /// Rejects non-positive amounts.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount <= 0`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Ledger amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// A persisted, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry id.
    pub id: LedgerEntryId,
    /// Account posted to.
    pub account: AccountRef,
    /// CREDIT or DEBIT.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency of the amount and balances.
    pub currency: CurrencyCode,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
    /// Position in the `(account, currency)` chain, starting at 1.
    pub version: i64,
    /// Owning document.
    pub reference: Reference,
    /// Free-text description.
    pub description: String,
    /// Acting user, if known.
    pub created_by: Option<UserId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}
