//! Sale and purchase document lifecycle.
//!
//! Stock only moves on `DRAFT -> APPROVED`; recording a document never
//! touches inventory.

use mizan_shared::types::CompanyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::LedgerError;

/// Document status.
///
/// The valid transitions are:
/// - Draft → Approved (approve)
/// - Draft → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    /// Recorded, stock untouched.
    Draft,
    /// Stock moved.
    Approved,
    /// Withdrawn before approval.
    Cancelled,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Approved => "APPROVED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns the status reached by `action`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for anything but a transition out of `DRAFT`.
    pub fn transition(self, action: DocumentAction) -> Result<Self, LedgerError> {
        match (self, action) {
            (Self::Draft, DocumentAction::Approve) => Ok(Self::Approved),
            (Self::Draft, DocumentAction::Cancel) => Ok(Self::Cancelled),
            (from, action) => Err(LedgerError::invalid_state(format!(
                "Cannot {} a document in status {}",
                action.as_str(),
                from.as_str()
            ))),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition requested on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    /// DRAFT → APPROVED.
    Approve,
    /// DRAFT → CANCELLED.
    Cancel,
}

impl DocumentAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Cancel => "cancel",
        }
    }
}

/// Signed stock change handed to the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    /// Company whose stock moves.
    pub company_id: CompanyId,
    /// Product.
    pub product_id: Uuid,
    /// Positive for stock in, negative for stock out.
    pub quantity: i64,
}

impl StockDelta {
    /// Stock leaving the selling company.
    #[must_use]
    pub fn sale(company_id: CompanyId, product_id: Uuid, quantity: i64) -> Self {
        Self {
            company_id,
            product_id,
            quantity: -quantity,
        }
    }

    /// Stock entering the buying company.
    #[must_use]
    pub fn purchase(company_id: CompanyId, product_id: Uuid, quantity: i64) -> Self {
        Self {
            company_id,
            product_id,
            quantity,
        }
    }
}

/// One priced product line of a sale or purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    /// Product.
    pub product_id: Uuid,
    /// Units, always positive.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: Decimal,
}

impl DocumentLine {
    /// `quantity × unit_price`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the product leaves the decimal range.
    pub fn total(&self) -> Result<Decimal, LedgerError> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or_else(LedgerError::out_of_range)
    }
}

/// Checks that a document has lines with positive quantities and
/// non-negative prices, and returns its total.
///
/// # Errors
///
/// Returns a validation error for an empty or malformed line list, or a
/// total outside the decimal range.
pub fn validate_lines(lines: &[DocumentLine]) -> Result<Decimal, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::validation("At least one line is required"));
    }
    for (index, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(LedgerError::validation(format!(
                "Line {}: quantity must be positive",
                index + 1
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "Line {}: unit price cannot be negative",
                index + 1
            )));
        }
    }
    lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        sum.checked_add(line.total()?)
            .ok_or_else(LedgerError::out_of_range)
    })
}
