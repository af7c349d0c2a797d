//! Obligation domain types.

use mizan_shared::types::{CurrencyCode, ObligationId, PartyId, TreasuryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Reference;

/// Obligation status.
///
/// The valid transitions are:
/// - Pending → Paid (installments reach the total)
/// - Paid → Pending (an installment is deleted)
/// - Pending → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObligationStatus {
    /// Open, accepts installments.
    Pending,
    /// Fully settled.
    Paid,
    /// Cancelled before settlement.
    Cancelled,
}

impl ObligationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating an obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObligation {
    /// Party owed, if any.
    pub party_id: Option<PartyId>,
    /// Amount owed.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// Rate to base currency at creation; 1 for the base currency.
    pub exchange_rate: Option<Decimal>,
    /// Document that created the debt.
    pub origin: Reference,
    /// Book the party's claim `(PURCHASE, obligation_id)` together with the
    /// obligation.
    #[serde(default)]
    pub record_claim: bool,
}

/// Input for paying part of an obligation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInstallment {
    /// Amount in the obligation's currency.
    pub amount: Decimal,
    /// Treasury to pay from, held in the obligation currency or the base
    /// currency.
    pub treasury_id: Option<TreasuryId>,
    /// Cash, cheque, transfer...
    pub payment_method: Option<String>,
    /// External reference such as a cheque number.
    pub reference_number: Option<String>,
    /// Settlement-time rate; the obligation's stored rate when absent.
    pub exchange_rate: Option<Decimal>,
}

/// What the installment rules need to know about an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObligationState {
    /// Obligation id.
    pub id: ObligationId,
    /// Current status.
    pub status: ObligationStatus,
    /// Amount owed.
    pub total_amount: Decimal,
    /// Sum of installments so far.
    pub paid: Decimal,
}

/// Outcome of a validated installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentPlan {
    /// Installment amount.
    pub amount: Decimal,
    /// Sum of installments including this one.
    pub paid: Decimal,
    /// Amount still owed afterwards.
    pub remaining: Decimal,
    /// Status afterwards.
    pub status: ObligationStatus,
}

/// New stored rate and base amount for a late-bound settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRebind {
    /// Settlement-time rate.
    pub exchange_rate: Decimal,
    /// `total_amount × exchange_rate`, rounded.
    pub base_amount: Decimal,
}
