//! Inter-company sales.
//!
//! A branch sells goods it takes from its parent company. One request books
//! the customer-facing sale at branch prices and the branch's credit purchase
//! from the parent at parent prices.

use mizan_shared::types::CompanyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{validate_lines, DocumentLine};
use crate::ledger::LedgerError;

/// One product line priced for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterCompanySaleLine {
    /// Product.
    pub product_id: Uuid,
    /// Units sold.
    pub quantity: i64,
    /// Price the parent charges the branch.
    pub parent_unit_price: Decimal,
    /// Price the branch charges the customer.
    pub branch_unit_price: Decimal,
}

impl InterCompanySaleLine {
    /// The line as it appears on the customer sale.
    #[must_use]
    pub fn sale_line(&self) -> DocumentLine {
        DocumentLine {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.branch_unit_price,
        }
    }

    /// The line as it appears on the purchase from the parent.
    #[must_use]
    pub fn purchase_line(&self) -> DocumentLine {
        DocumentLine {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.parent_unit_price,
        }
    }
}

/// A company and its parent, if it is a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyLink {
    /// The company.
    pub id: CompanyId,
    /// Its parent company.
    pub parent_id: Option<CompanyId>,
}

/// Totals of a validated inter-company sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterCompanySalePlan {
    /// Lines of the customer sale.
    pub sale_lines: Vec<DocumentLine>,
    /// Lines of the purchase from the parent.
    pub purchase_lines: Vec<DocumentLine>,
    /// `Σ qty × branch_unit_price`.
    pub branch_total: Decimal,
    /// `Σ qty × parent_unit_price`.
    pub parent_total: Decimal,
    /// `branch_total − parent_total`.
    pub margin: Decimal,
}

/// Validates an inter-company sale and computes its totals.
///
/// The relationship is checked before the lines so a mismatched pair of
/// companies is always reported as such.
///
/// # Errors
///
/// - `MismatchedRelationship` if `branch.parent_id != parent_id`
/// - `Validation` for empty lines, non-positive quantities, or negative prices
pub fn plan_inter_company_sale(
    branch: &CompanyLink,
    parent_id: CompanyId,
    lines: &[InterCompanySaleLine],
) -> Result<InterCompanySalePlan, LedgerError> {
    if branch.parent_id != Some(parent_id) {
        return Err(LedgerError::MismatchedRelationship {
            branch_id: branch.id.into_inner(),
            parent_id: parent_id.into_inner(),
        });
    }

    let sale_lines: Vec<DocumentLine> = lines.iter().map(InterCompanySaleLine::sale_line).collect();
    let purchase_lines: Vec<DocumentLine> =
        lines.iter().map(InterCompanySaleLine::purchase_line).collect();

    let branch_total = validate_lines(&sale_lines)?;
    let parent_total = validate_lines(&purchase_lines)?;
    let margin = branch_total
        .checked_sub(parent_total)
        .ok_or_else(LedgerError::out_of_range)?;

    Ok(InterCompanySalePlan {
        sale_lines,
        purchase_lines,
        branch_total,
        parent_total,
        margin,
    })
}
