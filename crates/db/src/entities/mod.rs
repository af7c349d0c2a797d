//! `SeaORM` entities.

pub mod companies;
pub mod installments;
pub mod ledger_balances;
pub mod ledger_entries;
pub mod parties;
pub mod payment_obligations;
pub mod purchase_expenses;
pub mod purchase_lines;
pub mod purchases;
pub mod sale_lines;
pub mod sales;
pub mod sea_orm_active_enums;
pub mod stock_movements;
pub mod treasuries;
