//! `SeaORM` Entity for installments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub obligation_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub base_amount: Decimal,
    pub treasury_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub created_by: Option<Uuid>,
    pub paid_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_obligations::Entity",
        from = "Column::ObligationId",
        to = "super::payment_obligations::Column::Id"
    )]
    PaymentObligations,
}

impl Related<super::payment_obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentObligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
