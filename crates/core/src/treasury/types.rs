//! Treasury domain types.

use mizan_shared::types::{CompanyId, CurrencyCode, TreasuryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a treasury account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TreasuryKind {
    /// Cash box of one company.
    Company,
    /// Shared cash box.
    General,
    /// Bank account.
    Bank,
}

/// Input for creating a treasury.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTreasury {
    /// Display name.
    pub name: String,
    /// Kind of account.
    pub kind: TreasuryKind,
    /// Owning company, required for `COMPANY`.
    pub company_id: Option<CompanyId>,
    /// Bank name, required for `BANK`.
    pub bank_name: Option<String>,
    /// Currency; the configured base currency when absent.
    pub currency: Option<CurrencyCode>,
}

/// The parts of a treasury the movement rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryInfo {
    /// Treasury id.
    pub id: TreasuryId,
    /// Whether movements are allowed.
    pub is_active: bool,
    /// Cached balance.
    pub current_balance: Decimal,
    /// Account currency.
    pub currency: CurrencyCode,
}
