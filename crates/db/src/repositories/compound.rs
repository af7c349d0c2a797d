//! Compound transactions.
//!
//! Each operation writes several records that must land together. The one
//! exception is the deferred expense-claim fan-out, which runs after the main
//! transaction has committed.

use chrono::Utc;
use mizan_core::compound::{
    plan_expenses, plan_inter_company_sale, ExpenseInput, InterCompanySaleLine, PurchaseTotals,
};
use mizan_core::document::DocumentStatus;
use mizan_core::ledger::{LedgerEntry, Reference, ReferenceKind};
use mizan_core::obligation::NewObligation;
use mizan_core::LedgerError;
use mizan_shared::types::{CompanyId, PartyId, UserId};
use mizan_shared::ExpenseLedgerMode;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::company::company_link;
use super::document::{
    insert_purchase, insert_sale, lock_purchase, PurchaseDraft, PurchaseView, SaleDraft, SaleView,
};
use super::obligation::{book_claim, create_in};
use super::party::party_account;
use crate::convert::stored_currency;
use crate::entities::sea_orm_active_enums::PaymentMode;
use crate::entities::{payment_obligations, purchase_expenses, purchases};
use crate::error::FinanceError;
use crate::settings::LedgerSettings;

/// Input for an inter-company sale.
#[derive(Debug, Clone, Deserialize)]
pub struct InterCompanySaleInput {
    /// End customer, if known.
    pub customer_id: Option<PartyId>,
    /// Selling branch.
    pub branch_company_id: CompanyId,
    /// Parent supplying the goods.
    pub parent_company_id: CompanyId,
    /// Lines priced for both sides.
    pub lines: Vec<InterCompanySaleLine>,
}

/// Both documents of an inter-company sale.
#[derive(Debug, Clone, Serialize)]
pub struct InterCompanySaleResult {
    /// Customer-facing sale at branch prices.
    pub sale: SaleView,
    /// Branch's credit purchase from the parent at parent prices.
    pub purchase: PurchaseView,
    /// Sale total.
    pub branch_total: Decimal,
    /// Purchase total.
    pub parent_total: Decimal,
    /// `branch_total − parent_total`.
    pub margin: Decimal,
}

/// A claim entry that could not be booked after commit.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerFailure {
    /// Obligation whose claim is missing.
    pub obligation_id: Uuid,
    /// Why the entry failed.
    pub error: String,
}

/// Outcome of an expense allocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseAllocation {
    /// The purchase with updated totals.
    pub purchase: purchases::Model,
    /// Stored expenses in input order.
    pub expenses: Vec<purchase_expenses::Model>,
    /// Obligations opened for actual expenses.
    pub obligations: Vec<payment_obligations::Model>,
    /// Claim entries booked for those obligations.
    pub claim_entries: Vec<LedgerEntry>,
    /// Claims that failed in deferred mode.
    pub ledger_failures: Vec<LedgerFailure>,
}

/// Compound transaction repository.
#[derive(Debug, Clone)]
pub struct CompoundRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl CompoundRepository {
    /// Creates a new compound transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Records a branch sale of parent-supplied goods.
    ///
    /// Creates the customer sale and the branch's credit purchase from the
    /// parent in one transaction. Stock is untouched until each document is
    /// approved.
    ///
    /// # Errors
    ///
    /// Returns `MismatchedRelationship` when the branch is not a child of the
    /// parent, a validation error for bad lines, or `NotFound` for an unknown
    /// company or customer. Nothing is written on error.
    pub async fn execute_inter_company_sale(
        &self,
        input: InterCompanySaleInput,
        created_by: Option<UserId>,
    ) -> Result<InterCompanySaleResult, FinanceError> {
        let txn = self.db.begin().await?;

        let branch = company_link(&txn, input.branch_company_id).await?;
        let plan = plan_inter_company_sale(&branch, input.parent_company_id, &input.lines)?;
        if let Some(customer_id) = input.customer_id {
            party_account(&txn, customer_id).await?;
        }

        let purchase = insert_purchase(
            &txn,
            PurchaseDraft {
                company_id: input.branch_company_id,
                supplier_id: None,
                source_company_id: Some(input.parent_company_id),
                payment_mode: PaymentMode::Credit,
                created_by,
            },
            &plan.purchase_lines,
        )
        .await?;
        let sale = insert_sale(
            &txn,
            SaleDraft {
                company_id: input.branch_company_id,
                customer_id: input.customer_id,
                is_inter_company: true,
                linked_purchase_id: Some(purchase.purchase.id),
                created_by,
            },
            &plan.sale_lines,
        )
        .await?;

        txn.commit().await?;

        info!(
            sale_id = %sale.sale.id,
            purchase_id = %purchase.purchase.id,
            branch_total = %plan.branch_total,
            parent_total = %plan.parent_total,
            margin = %plan.margin,
            "Inter-company sale recorded"
        );

        Ok(InterCompanySaleResult {
            sale,
            purchase,
            branch_total: plan.branch_total,
            parent_total: plan.parent_total,
            margin: plan.margin,
        })
    }

    /// Adds landed-cost expenses to an approved purchase.
    ///
    /// Actual expenses open a `PENDING` obligation for their supplier and a
    /// claim `(PURCHASE, obligation_id)` on the supplier's ledger. In deferred
    /// mode the claims are booked one by one after the main transaction
    /// commits; a failed claim is logged and reported in `ledger_failures`
    /// without undoing the committed rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the purchase is `APPROVED`, a validation
    /// error for a bad batch, or `NotFound` for an unknown purchase or
    /// supplier.
    pub async fn allocate_purchase_expenses(
        &self,
        purchase_id: Uuid,
        expenses: Vec<ExpenseInput>,
        created_by: Option<UserId>,
    ) -> Result<ExpenseAllocation, FinanceError> {
        let atomic = self.settings.expense_ledger_mode == ExpenseLedgerMode::Atomic;
        let txn = self.db.begin().await?;

        let purchase = lock_purchase(&txn, purchase_id).await?;
        let plan = plan_expenses(
            DocumentStatus::from(purchase.status),
            PurchaseTotals {
                total: purchase.total,
                total_expenses: purchase.total_expenses,
                final_total: purchase.final_total,
            },
            expenses,
            &self.settings.base_currency,
        )?;

        let now = Utc::now().into();
        let mut stored = Vec::with_capacity(plan.expenses.len());
        let mut obligations = Vec::new();
        let mut claim_entries = Vec::new();

        for expense in plan.expenses {
            let obligation = match expense.debt_supplier() {
                Some(supplier_id) => {
                    let (obligation, claim) = create_in(
                        &txn,
                        &self.settings,
                        NewObligation {
                            party_id: Some(supplier_id),
                            amount: expense.input.amount,
                            currency: expense.input.currency.clone(),
                            exchange_rate: Some(expense.exchange_rate),
                            origin: Reference::new(ReferenceKind::Purchase, purchase_id),
                            record_claim: atomic,
                        },
                        created_by,
                    )
                    .await?;
                    claim_entries.extend(claim);
                    Some(obligation)
                }
                None => None,
            };

            stored.push(
                purchase_expenses::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    purchase_id: Set(purchase_id),
                    description: Set(expense.input.description.clone()),
                    amount: Set(expense.input.amount),
                    currency: Set(expense.input.currency.as_str().to_string()),
                    exchange_rate: Set(expense.exchange_rate),
                    base_amount: Set(expense.base_amount),
                    is_actual_expense: Set(expense.input.is_actual_expense),
                    supplier_id: Set(expense.debt_supplier().map(PartyId::into_inner)),
                    obligation_id: Set(obligation.as_ref().map(|o| o.id)),
                    created_by: Set(created_by.map(UserId::into_inner)),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await?,
            );
            obligations.extend(obligation);
        }

        let mut model: purchases::ActiveModel = purchase.into();
        model.total_expenses = Set(plan.totals.total_expenses);
        model.final_total = Set(plan.totals.final_total);
        model.updated_at = Set(now);
        let purchase = model.update(&txn).await?;

        txn.commit().await?;

        info!(
            %purchase_id,
            expenses = stored.len(),
            obligations = obligations.len(),
            added = %plan.added,
            final_total = %purchase.final_total,
            "Purchase expenses allocated"
        );

        let mut ledger_failures = Vec::new();
        if !atomic {
            for obligation in &obligations {
                match self.book_deferred_claim(obligation, created_by).await {
                    Ok(entry) => claim_entries.push(entry),
                    Err(err) => {
                        warn!(
                            obligation_id = %obligation.id,
                            error = %err,
                            "Deferred expense claim failed"
                        );
                        ledger_failures.push(LedgerFailure {
                            obligation_id: obligation.id,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        Ok(ExpenseAllocation {
            purchase,
            expenses: stored,
            obligations,
            claim_entries,
            ledger_failures,
        })
    }

    async fn book_deferred_claim(
        &self,
        obligation: &payment_obligations::Model,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        let Some(party_id) = obligation.party_id else {
            return Err(LedgerError::Internal(format!(
                "Expense obligation {} has no supplier",
                obligation.id
            ))
            .into());
        };

        let txn = self.db.begin().await?;
        let account = party_account(&txn, PartyId::from_uuid(party_id)).await?;
        let entry = book_claim(
            &txn,
            account,
            obligation,
            stored_currency(&obligation.currency)?,
            format!("Expense claim for obligation {}", obligation.id),
            created_by,
        )
        .await?;
        txn.commit().await?;
        Ok(entry)
    }
}
