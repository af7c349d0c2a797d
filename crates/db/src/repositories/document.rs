//! Sale and purchase documents.
//!
//! Documents follow `DRAFT -> APPROVED` or `DRAFT -> CANCELLED`. Approval
//! hands the stock deltas to the [`StockGateway`] inside the same
//! transaction as the status change.

use std::sync::Arc;

use chrono::Utc;
use mizan_core::document::{
    validate_lines, DocumentAction, DocumentLine, DocumentStatus, StockDelta,
};
use mizan_core::LedgerError;
use mizan_shared::types::{CompanyId, PartyId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::company::find_company;
use super::party::party_account;
use crate::entities::sea_orm_active_enums::{DocumentKind, PaymentMode};
use crate::entities::{purchase_lines, purchases, sale_lines, sales};
use crate::error::FinanceError;
use crate::lock::for_update;
use crate::stock::StockGateway;

/// Input for recording a purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    /// Buying company.
    pub company_id: CompanyId,
    /// Supplier, if any.
    pub supplier_id: Option<PartyId>,
    /// Priced lines.
    pub lines: Vec<DocumentLine>,
}

/// Input for recording a sale.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    /// Selling company.
    pub company_id: CompanyId,
    /// Customer, if any.
    pub customer_id: Option<PartyId>,
    /// Priced lines.
    pub lines: Vec<DocumentLine>,
}

/// A sale with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    /// The sale row.
    pub sale: sales::Model,
    /// Its lines.
    pub lines: Vec<sale_lines::Model>,
}

/// A purchase with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    /// The purchase row.
    pub purchase: purchases::Model,
    /// Its lines.
    pub lines: Vec<purchase_lines::Model>,
}

/// Header fields of a new purchase.
pub(crate) struct PurchaseDraft {
    pub company_id: CompanyId,
    pub supplier_id: Option<PartyId>,
    pub source_company_id: Option<CompanyId>,
    pub payment_mode: PaymentMode,
    pub created_by: Option<UserId>,
}

/// Header fields of a new sale.
pub(crate) struct SaleDraft {
    pub company_id: CompanyId,
    pub customer_id: Option<PartyId>,
    pub is_inter_company: bool,
    pub linked_purchase_id: Option<Uuid>,
    pub created_by: Option<UserId>,
}

/// Document repository.
#[derive(Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
    stock: Arc<dyn StockGateway>,
}

impl std::fmt::Debug for DocumentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRepository").finish_non_exhaustive()
    }
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, stock: Arc<dyn StockGateway>) -> Self {
        Self { db, stock }
    }

    /// Records a `DRAFT` cash purchase.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad lines, or `NotFound` for an
    /// unknown company or supplier.
    pub async fn create_purchase(
        &self,
        input: NewPurchase,
        created_by: Option<UserId>,
    ) -> Result<PurchaseView, FinanceError> {
        let txn = self.db.begin().await?;
        find_company(&txn, input.company_id).await?;
        if let Some(supplier_id) = input.supplier_id {
            party_account(&txn, supplier_id).await?;
        }

        let view = insert_purchase(
            &txn,
            PurchaseDraft {
                company_id: input.company_id,
                supplier_id: input.supplier_id,
                source_company_id: None,
                payment_mode: PaymentMode::Cash,
                created_by,
            },
            &input.lines,
        )
        .await?;
        txn.commit().await?;

        info!(
            purchase_id = %view.purchase.id,
            total = %view.purchase.total,
            "Purchase recorded"
        );
        Ok(view)
    }

    /// Records a `DRAFT` sale.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad lines, or `NotFound` for an
    /// unknown company or customer.
    pub async fn create_sale(
        &self,
        input: NewSale,
        created_by: Option<UserId>,
    ) -> Result<SaleView, FinanceError> {
        let txn = self.db.begin().await?;
        find_company(&txn, input.company_id).await?;
        if let Some(customer_id) = input.customer_id {
            party_account(&txn, customer_id).await?;
        }

        let view = insert_sale(
            &txn,
            SaleDraft {
                company_id: input.company_id,
                customer_id: input.customer_id,
                is_inter_company: false,
                linked_purchase_id: None,
                created_by,
            },
            &input.lines,
        )
        .await?;
        txn.commit().await?;

        info!(sale_id = %view.sale.id, total = %view.sale.total, "Sale recorded");
        Ok(view)
    }

    /// Gets a purchase with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the purchase does not exist.
    pub async fn get_purchase(&self, id: Uuid) -> Result<PurchaseView, FinanceError> {
        let purchase = purchases::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::not_found("Purchase", id))?;
        let lines = purchase_lines_of(&self.db, id).await?;
        Ok(PurchaseView { purchase, lines })
    }

    /// Gets a sale with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the sale does not exist.
    pub async fn get_sale(&self, id: Uuid) -> Result<SaleView, FinanceError> {
        let sale = sales::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::not_found("Sale", id))?;
        let lines = sale_lines_of(&self.db, id).await?;
        Ok(SaleView { sale, lines })
    }

    /// Approves a draft sale and moves its stock out of the selling company.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InvalidState` unless the sale is `DRAFT`.
    pub async fn approve_sale(&self, id: Uuid) -> Result<sales::Model, FinanceError> {
        let txn = self.db.begin().await?;

        let sale = lock_sale(&txn, id).await?;
        let status = DocumentStatus::from(sale.status).transition(DocumentAction::Approve)?;
        let company_id = CompanyId::from_uuid(sale.company_id);
        let deltas: Vec<StockDelta> = sale_lines_of(&txn, id)
            .await?
            .iter()
            .map(|line| StockDelta::sale(company_id, line.product_id, line.quantity))
            .collect();
        self.stock
            .apply(&txn, DocumentKind::Sale, id, &deltas)
            .await?;

        let now = Utc::now().into();
        let mut model: sales::ActiveModel = sale.into();
        model.status = Set(status.into());
        model.approved_at = Set(Some(now));
        model.updated_at = Set(now);
        let sale = model.update(&txn).await?;

        txn.commit().await?;

        info!(sale_id = %id, lines = deltas.len(), "Sale approved");
        Ok(sale)
    }

    /// Approves a draft purchase and moves its stock into the buying company.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InvalidState` unless the purchase is `DRAFT`.
    pub async fn approve_purchase(&self, id: Uuid) -> Result<purchases::Model, FinanceError> {
        let txn = self.db.begin().await?;

        let purchase = lock_purchase(&txn, id).await?;
        let status = DocumentStatus::from(purchase.status).transition(DocumentAction::Approve)?;
        let company_id = CompanyId::from_uuid(purchase.company_id);
        let deltas: Vec<StockDelta> = purchase_lines_of(&txn, id)
            .await?
            .iter()
            .map(|line| StockDelta::purchase(company_id, line.product_id, line.quantity))
            .collect();
        self.stock
            .apply(&txn, DocumentKind::Purchase, id, &deltas)
            .await?;

        let now = Utc::now().into();
        let mut model: purchases::ActiveModel = purchase.into();
        model.status = Set(status.into());
        model.approved_at = Set(Some(now));
        model.updated_at = Set(now);
        let purchase = model.update(&txn).await?;

        txn.commit().await?;

        info!(purchase_id = %id, lines = deltas.len(), "Purchase approved");
        Ok(purchase)
    }

    /// Cancels a draft sale together with its linked purchase from the
    /// parent company.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InvalidState` unless both documents are
    /// `DRAFT`.
    pub async fn cancel_sale(&self, id: Uuid) -> Result<sales::Model, FinanceError> {
        let txn = self.db.begin().await?;

        let sale = lock_sale(&txn, id).await?;
        let status = DocumentStatus::from(sale.status).transition(DocumentAction::Cancel)?;
        if let Some(purchase_id) = sale.linked_purchase_id {
            cancel_purchase_in(&txn, purchase_id).await?;
        }

        let mut model: sales::ActiveModel = sale.into();
        model.status = Set(status.into());
        model.updated_at = Set(Utc::now().into());
        let sale = model.update(&txn).await?;

        txn.commit().await?;

        info!(sale_id = %id, linked_purchase_id = ?sale.linked_purchase_id, "Sale cancelled");
        Ok(sale)
    }

    /// Cancels a draft purchase.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InvalidState` unless the purchase is `DRAFT`.
    pub async fn cancel_purchase(&self, id: Uuid) -> Result<purchases::Model, FinanceError> {
        let txn = self.db.begin().await?;
        let purchase = cancel_purchase_in(&txn, id).await?;
        txn.commit().await?;

        info!(purchase_id = %id, "Purchase cancelled");
        Ok(purchase)
    }
}

async fn cancel_purchase_in(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<purchases::Model, FinanceError> {
    let purchase = lock_purchase(txn, id).await?;
    let status = DocumentStatus::from(purchase.status).transition(DocumentAction::Cancel)?;

    let mut model: purchases::ActiveModel = purchase.into();
    model.status = Set(status.into());
    model.updated_at = Set(Utc::now().into());
    Ok(model.update(txn).await?)
}

/// Inserts a `DRAFT` purchase and its lines.
pub(crate) async fn insert_purchase<C: ConnectionTrait>(
    conn: &C,
    draft: PurchaseDraft,
    lines: &[DocumentLine],
) -> Result<PurchaseView, FinanceError> {
    let total = validate_lines(lines)?;
    let now = Utc::now().into();
    let purchase = purchases::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(draft.company_id.into_inner()),
        supplier_id: Set(draft.supplier_id.map(PartyId::into_inner)),
        source_company_id: Set(draft.source_company_id.map(CompanyId::into_inner)),
        payment_mode: Set(draft.payment_mode),
        status: Set(DocumentStatus::Draft.into()),
        total: Set(total),
        total_expenses: Set(Decimal::ZERO),
        final_total: Set(total),
        created_by: Set(draft.created_by.map(UserId::into_inner)),
        created_at: Set(now),
        approved_at: Set(None),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut stored = Vec::with_capacity(lines.len());
    for line in lines {
        stored.push(
            purchase_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                purchase_id: Set(purchase.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.total()?),
            }
            .insert(conn)
            .await?,
        );
    }

    Ok(PurchaseView {
        purchase,
        lines: stored,
    })
}

/// Inserts a `DRAFT` sale and its lines.
///
/// Lines of an inter-company sale are flagged as supplied by the parent.
pub(crate) async fn insert_sale<C: ConnectionTrait>(
    conn: &C,
    draft: SaleDraft,
    lines: &[DocumentLine],
) -> Result<SaleView, FinanceError> {
    let total = validate_lines(lines)?;
    let now = Utc::now().into();
    let sale = sales::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(draft.company_id.into_inner()),
        customer_id: Set(draft.customer_id.map(PartyId::into_inner)),
        status: Set(DocumentStatus::Draft.into()),
        total: Set(total),
        is_inter_company: Set(draft.is_inter_company),
        linked_purchase_id: Set(draft.linked_purchase_id),
        created_by: Set(draft.created_by.map(UserId::into_inner)),
        created_at: Set(now),
        approved_at: Set(None),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut stored = Vec::with_capacity(lines.len());
    for line in lines {
        stored.push(
            sale_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                sale_id: Set(sale.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.total()?),
                is_from_parent_company: Set(draft.is_inter_company),
            }
            .insert(conn)
            .await?,
        );
    }

    Ok(SaleView {
        sale,
        lines: stored,
    })
}

pub(crate) async fn lock_purchase<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchases::Model, FinanceError> {
    Ok(for_update(purchases::Entity::find_by_id(id), conn)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Purchase", id))?)
}

async fn lock_sale<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<sales::Model, FinanceError> {
    Ok(for_update(sales::Entity::find_by_id(id), conn)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Sale", id))?)
}

async fn purchase_lines_of<C: ConnectionTrait>(
    conn: &C,
    purchase_id: Uuid,
) -> Result<Vec<purchase_lines::Model>, FinanceError> {
    Ok(purchase_lines::Entity::find()
        .filter(purchase_lines::Column::PurchaseId.eq(purchase_id))
        .order_by_asc(purchase_lines::Column::Id)
        .all(conn)
        .await?)
}

async fn sale_lines_of<C: ConnectionTrait>(
    conn: &C,
    sale_id: Uuid,
) -> Result<Vec<sale_lines::Model>, FinanceError> {
    Ok(sale_lines::Entity::find()
        .filter(sale_lines::Column::SaleId.eq(sale_id))
        .order_by_asc(sale_lines::Column::Id)
        .all(conn)
        .await?)
}
