//! `SeaORM` Entity for purchases table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DocumentStatus, PaymentMode};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub source_company_id: Option<Uuid>,
    pub payment_mode: PaymentMode,
    pub status: DocumentStatus,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_expenses: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub final_total: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_lines::Entity")]
    PurchaseLines,
    #[sea_orm(has_many = "super::purchase_expenses::Entity")]
    PurchaseExpenses,
}

impl Related<super::purchase_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseLines.def()
    }
}

impl Related<super::purchase_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
