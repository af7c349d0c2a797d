//! Boundary to the external inventory service.
//!
//! Stock deltas are handed over inside the same database transaction as the
//! `DRAFT -> APPROVED` transition, so a failed hand-over rolls the approval
//! back.

use async_trait::async_trait;
use chrono::Utc;
use mizan_core::document::StockDelta;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, DbErr, Set};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::DocumentKind, stock_movements};

/// Receives stock changes for an approved document.
#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Applies `deltas` for `document_id` within `txn`.
    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        document_kind: DocumentKind,
        document_id: Uuid,
        deltas: &[StockDelta],
    ) -> Result<(), DbErr>;
}

/// Journals deltas to `stock_movements` for the inventory service to consume.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockMovementJournal;

#[async_trait]
impl StockGateway for StockMovementJournal {
    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        document_kind: DocumentKind,
        document_id: Uuid,
        deltas: &[StockDelta],
    ) -> Result<(), DbErr> {
        let now = Utc::now().into();
        for delta in deltas {
            stock_movements::ActiveModel {
                id: Set(Uuid::now_v7()),
                company_id: Set(delta.company_id.into_inner()),
                product_id: Set(delta.product_id),
                quantity: Set(delta.quantity),
                document_kind: Set(document_kind),
                document_id: Set(document_id),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
        }
        Ok(())
    }
}
