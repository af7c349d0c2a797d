//! Row locking under real parallelism.
//!
//! The SQLite fixtures run on a single pooled connection, so writers there
//! queue instead of racing. These tests need a Postgres database in
//! `DATABASE_URL` and are skipped without one. Every task below holds its own
//! pooled connection and waits on a barrier before writing.

mod common;

use std::env;
use std::sync::Arc;

use common::{general_treasury, lyd, payment, settings, supplier};
use futures::future::join_all;
use mizan_core::ledger::{AccountRef, Direction, NewLedgerEntry, PartyKind, Reference, ReferenceKind};
use mizan_core::obligation::{NewInstallment, NewObligation};
use mizan_db::migration::{Migrator, MigratorTrait};
use mizan_db::{FinanceError, LedgerRepository, ObligationRepository, TreasuryRepository};
use mizan_shared::types::ObligationId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::{Barrier, OnceCell};
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn postgres() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("Skipping test - DATABASE_URL not set");
        return None;
    };
    if !url.starts_with("postgres") {
        eprintln!("Skipping test - DATABASE_URL is not a Postgres URL");
        return None;
    }

    let mut options = ConnectOptions::new(url);
    options.max_connections(16).sqlx_logging(false);
    let db = match Database::connect(options).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {e}");
            return None;
        }
    };

    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("run migrations");
        })
        .await;
    Some(db)
}

/// Runs `tasks` copies of `work` on separate tasks released together.
async fn race<T, F, Fut>(tasks: usize, work: F) -> Vec<Result<T, FinanceError>>
where
    T: Send + 'static,
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T, FinanceError>> + Send + 'static,
{
    let barrier = Arc::new(Barrier::new(tasks));
    let handles = (0..tasks).map(|i| {
        let barrier = Arc::clone(&barrier);
        let attempt = work(i);
        tokio::spawn(async move {
            barrier.wait().await;
            attempt.await
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_withdrawals_cannot_overdraw() {
    let Some(db) = postgres().await else { return };
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, dec!(100)).await;

    let results = race(8, |_| {
        let repo = repo.clone();
        async move { repo.withdraw(treasury, payment(dec!(30)), None).await }
    })
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
    }
    assert_eq!(repo.get(treasury).await.unwrap().current_balance, dec!(10));

    let verification = LedgerRepository::new(db)
        .verify_chain(AccountRef::treasury(treasury), &lyd())
        .await
        .unwrap();
    assert!(verification.is_consistent);
    assert_eq!(verification.report.entries_checked, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_appends_keep_chain_intact() {
    let Some(db) = postgres().await else { return };
    let party = supplier(&db).await;
    let account = AccountRef::party(PartyKind::Supplier, party);
    let ledger = LedgerRepository::new(db.clone());

    let results = race(20, |i| {
        let ledger = ledger.clone();
        let direction = if (i + 1) % 4 == 0 {
            Direction::Debit
        } else {
            Direction::Credit
        };
        async move {
            ledger
                .append(NewLedgerEntry {
                    account,
                    direction,
                    amount: Decimal::from(i + 1),
                    currency: lyd(),
                    reference: Reference::new(ReferenceKind::Adjustment, Uuid::now_v7()),
                    description: String::new(),
                    created_by: None,
                })
                .await
        }
    })
    .await;
    assert!(results.iter().all(Result::is_ok));

    let mut versions: Vec<i64> = results
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.version)
        .collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=20).collect::<Vec<i64>>());

    // credits 1..=20 minus twice the multiples of four
    let expected = dec!(210) - dec!(120);
    let verification = ledger.verify_chain(account, &lyd()).await.unwrap();
    assert!(verification.is_consistent);
    assert_eq!(verification.report.replayed_balance, expected);
    assert_eq!(verification.cached_balance, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_installments_cannot_overpay() {
    let Some(db) = postgres().await else { return };
    let repo = ObligationRepository::new(db.clone(), settings());
    let party = supplier(&db).await;
    let obligation = repo
        .create(
            NewObligation {
                party_id: Some(party),
                amount: dec!(100),
                currency: lyd(),
                exchange_rate: None,
                origin: Reference::new(ReferenceKind::Purchase, Uuid::now_v7()),
                record_claim: true,
            },
            None,
        )
        .await
        .unwrap();
    let id = ObligationId::from_uuid(obligation.id);

    let results = race(5, |_| {
        let repo = repo.clone();
        async move {
            repo.add_installment(
                id,
                NewInstallment {
                    amount: dec!(40),
                    ..NewInstallment::default()
                },
                None,
            )
            .await
        }
    })
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.error_code(), "OVERPAYMENT");
    }
    let view = repo.get(id).await.unwrap();
    assert_eq!(view.paid, dec!(80));

    let verification = LedgerRepository::new(db)
        .verify_chain(AccountRef::party(PartyKind::Supplier, party), &lyd())
        .await
        .unwrap();
    assert!(verification.is_consistent);
    assert_eq!(verification.cached_balance, dec!(20));
}
