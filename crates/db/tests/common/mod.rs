//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own in-memory SQLite database migrated by the same
//! `Migrator` as production. The pool holds a single connection, so the
//! database lives as long as the pool.

#![allow(dead_code)]

use mizan_core::ledger::{PartyKind, Reference, ReferenceKind};
use mizan_core::treasury::{NewTreasury, TreasuryKind};
use mizan_db::migration::{Migrator, MigratorTrait};
use mizan_db::repositories::TreasuryMovement;
use mizan_db::{LedgerSettings, PartyRepository, TreasuryRepository};
use mizan_shared::types::{CurrencyCode, PartyId, TreasuryId};
use mizan_shared::{ExpenseLedgerMode, ReversalPolicy};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).expect("valid currency code")
}

pub fn lyd() -> CurrencyCode {
    code("LYD")
}

pub fn usd() -> CurrencyCode {
    code("USD")
}

pub fn settings() -> LedgerSettings {
    settings_with(ReversalPolicy::Legacy, ExpenseLedgerMode::Deferred)
}

pub fn settings_with(
    reversal_policy: ReversalPolicy,
    expense_ledger_mode: ExpenseLedgerMode,
) -> LedgerSettings {
    LedgerSettings {
        base_currency: lyd(),
        reversal_policy,
        expense_ledger_mode,
    }
}

pub fn deposit(amount: Decimal) -> TreasuryMovement {
    TreasuryMovement {
        amount,
        reference: Reference::new(ReferenceKind::Deposit, Uuid::now_v7()),
        description: "Opening balance".to_string(),
    }
}

pub fn payment(amount: Decimal) -> TreasuryMovement {
    TreasuryMovement {
        amount,
        reference: Reference::new(ReferenceKind::Payment, Uuid::now_v7()),
        description: "Supplier payment".to_string(),
    }
}

/// A general LYD treasury, opened with `opening` when it is positive.
pub async fn general_treasury(db: &DatabaseConnection, opening: Decimal) -> TreasuryId {
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = repo
        .create(NewTreasury {
            name: format!("Cash box {}", Uuid::now_v7()),
            kind: TreasuryKind::General,
            company_id: None,
            bank_name: None,
            currency: None,
        })
        .await
        .expect("create treasury");
    let id = TreasuryId::from_uuid(treasury.id);

    if opening > Decimal::ZERO {
        repo.deposit(id, deposit(opening), None)
            .await
            .expect("opening deposit");
    }
    id
}

pub async fn supplier(db: &DatabaseConnection) -> PartyId {
    PartyRepository::new(db.clone())
        .create(PartyKind::Supplier, "Tripoli Freight")
        .await
        .expect("create supplier")
        .id
}
