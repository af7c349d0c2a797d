//! Treasury repository integration tests.

mod common;

use common::{deposit, general_treasury, lyd, payment, settings, test_db, usd};
use futures::future::join_all;
use mizan_core::ledger::{AccountRef, Direction, ReferenceKind};
use mizan_core::treasury::{NewTreasury, TreasuryKind};
use mizan_core::LedgerError;
use mizan_db::repositories::{TransferInput, TreasuryFilter};
use mizan_db::{CompanyRepository, FinanceError, LedgerRepository, TreasuryRepository};
use mizan_shared::types::{CompanyId, TreasuryId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_withdrawal_records_running_balance() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, dec!(1000)).await;

    let entry = repo
        .withdraw(treasury, payment(dec!(300)), None)
        .await
        .unwrap();

    assert_eq!(entry.direction, Direction::Debit);
    assert_eq!(entry.balance_before, dec!(1000));
    assert_eq!(entry.balance_after, dec!(700));
    assert_eq!(entry.reference.kind, ReferenceKind::Payment);
    assert_eq!(repo.get(treasury).await.unwrap().current_balance, dec!(700));

    let history = repo.transactions(treasury).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, entry.id);
}

#[tokio::test]
async fn test_withdrawal_beyond_balance_is_rejected() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, dec!(100)).await;

    let err = repo
        .withdraw(treasury, payment(dec!(100.01)), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FinanceError::Domain(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(repo.get(treasury).await.unwrap().current_balance, dec!(100));
    assert_eq!(repo.transactions(treasury).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_inactive_treasury_rejects_movements() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, dec!(50)).await;

    repo.set_active(treasury, false).await.unwrap();

    let err = repo
        .deposit(treasury, deposit(dec!(10)), None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INACTIVE_ACCOUNT");
}

#[tokio::test]
async fn test_unknown_treasury_is_not_found() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db, settings());

    let err = repo
        .deposit(TreasuryId::new(), deposit(dec!(10)), None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_bank_and_company_treasuries_need_their_fields() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());

    let err = repo
        .create(NewTreasury {
            name: "Jumhouria Bank".to_string(),
            kind: TreasuryKind::Bank,
            company_id: None,
            bank_name: None,
            currency: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let err = repo
        .create(NewTreasury {
            name: "Branch cash".to_string(),
            kind: TreasuryKind::Company,
            company_id: Some(CompanyId::new()),
            bank_name: None,
            currency: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let company = CompanyRepository::new(db.clone())
        .create("Mizan Trading", None)
        .await
        .unwrap();
    let created = repo
        .create(NewTreasury {
            name: "Branch cash".to_string(),
            kind: TreasuryKind::Company,
            company_id: Some(CompanyId::from_uuid(company.id)),
            bank_name: None,
            currency: Some(usd()),
        })
        .await
        .unwrap();
    assert_eq!(created.currency, "USD");
    assert_eq!(created.current_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_list_filters_by_kind_and_activity() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let first = general_treasury(&db, Decimal::ZERO).await;
    general_treasury(&db, Decimal::ZERO).await;
    repo.create(NewTreasury {
        name: "Wahda Bank".to_string(),
        kind: TreasuryKind::Bank,
        company_id: None,
        bank_name: Some("Wahda".to_string()),
        currency: None,
    })
    .await
    .unwrap();
    repo.set_active(first, false).await.unwrap();

    let general = repo
        .list(TreasuryFilter {
            kind: Some(TreasuryKind::General),
            ..TreasuryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(general.len(), 2);

    let active_general = repo
        .list(TreasuryFilter {
            kind: Some(TreasuryKind::General),
            active_only: true,
            ..TreasuryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(active_general.len(), 1);

    assert_eq!(repo.list(TreasuryFilter::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_transfer_moves_money_atomically() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let from = general_treasury(&db, dec!(500)).await;
    let to = general_treasury(&db, dec!(20)).await;

    let result = repo
        .transfer(
            TransferInput {
                from_treasury_id: from,
                to_treasury_id: to,
                amount: dec!(200),
                description: "Float for branch".to_string(),
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.outgoing.reference, result.incoming.reference);
    assert_eq!(result.outgoing.reference.kind, ReferenceKind::Transfer);
    assert_eq!(result.outgoing.reference.id, result.transfer_id);
    assert_eq!(result.outgoing.balance_after, dec!(300));
    assert_eq!(result.incoming.balance_after, dec!(220));
    assert_eq!(repo.get(from).await.unwrap().current_balance, dec!(300));
    assert_eq!(repo.get(to).await.unwrap().current_balance, dec!(220));
}

#[tokio::test]
async fn test_failed_transfer_writes_nothing() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let from = general_treasury(&db, dec!(100)).await;
    let to = general_treasury(&db, Decimal::ZERO).await;

    let err = repo
        .transfer(
            TransferInput {
                from_treasury_id: from,
                to_treasury_id: to,
                amount: dec!(150),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
    assert!(repo.transactions(to).await.unwrap().is_empty());

    let err = repo
        .transfer(
            TransferInput {
                from_treasury_id: from,
                to_treasury_id: from,
                amount: dec!(10),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SAME_ACCOUNT");

    repo.set_active(to, false).await.unwrap();
    let err = repo
        .transfer(
            TransferInput {
                from_treasury_id: from,
                to_treasury_id: to,
                amount: dec!(10),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INACTIVE_ACCOUNT");
    assert_eq!(repo.get(from).await.unwrap().current_balance, dec!(100));
}

#[tokio::test]
async fn test_movement_sequence_never_goes_negative() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, Decimal::ZERO).await;

    let steps = [
        (true, dec!(100)),
        (false, dec!(40)),
        (false, dec!(70)),
        (true, dec!(15)),
        (false, dec!(75)),
        (false, dec!(1)),
        (true, dec!(5)),
    ];
    let mut expected = Decimal::ZERO;
    for (is_deposit, amount) in steps {
        let result = if is_deposit {
            repo.deposit(treasury, deposit(amount), None).await
        } else {
            repo.withdraw(treasury, payment(amount), None).await
        };
        match result {
            Ok(entry) => {
                expected = entry.balance_after;
                assert!(entry.balance_after >= Decimal::ZERO);
            }
            Err(err) => {
                assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
                assert!(amount > expected);
            }
        }
    }

    assert_eq!(expected, dec!(5));
    let verification = LedgerRepository::new(db)
        .verify_chain(AccountRef::treasury(treasury), &lyd())
        .await
        .unwrap();
    assert!(verification.is_consistent);
    assert_eq!(verification.cached_balance, dec!(5));
}

#[tokio::test]
async fn test_queued_withdrawals_cannot_overdraw() {
    let db = test_db().await;
    let repo = TreasuryRepository::new(db.clone(), settings());
    let treasury = general_treasury(&db, dec!(100)).await;

    let attempts = (0..8).map(|_| {
        let repo = repo.clone();
        async move { repo.withdraw(treasury, payment(dec!(30)), None).await }
    });
    let results = join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    assert_eq!(repo.get(treasury).await.unwrap().current_balance, dec!(10));

    let verification = LedgerRepository::new(db)
        .verify_chain(AccountRef::treasury(treasury), &lyd())
        .await
        .unwrap();
    assert!(verification.is_consistent);
    assert_eq!(verification.report.entries_checked, 4);
}
