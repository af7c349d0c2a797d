//! Ledger entry store.
//!
//! Every balance change is appended here. An append locks the
//! `(account, currency)` balance row, reads the newest entry, and writes the
//! next link of the chain together with the refreshed cache.

use std::collections::BTreeMap;

use chrono::Utc;
use mizan_core::ledger::{
    verify_chain, AccountRef, ChainLink, ChainReport, LedgerEntry, NewLedgerEntry, Reference,
    RunningBalance, Statement,
};
use mizan_shared::types::{CurrencyCode, PageRequest, PageResponse, TreasuryId};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::convert::{entry_from_model, stored_currency};
use crate::entities::{ledger_balances, ledger_entries, treasuries};
use crate::error::FinanceError;
use crate::lock::for_update;

/// Cache consistency of one `(account, currency)` chain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChainVerification {
    /// Replay of the stored entries.
    pub report: ChainReport,
    /// Cached balance in `ledger_balances`, zero when absent.
    pub cached_balance: Decimal,
    /// True when the chain replays cleanly and the cache matches it.
    pub is_consistent: bool,
}

/// Repository over the ledger entry store.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one entry in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, or a database
    /// error.
    pub async fn append(&self, input: NewLedgerEntry) -> Result<LedgerEntry, FinanceError> {
        let txn = self.db.begin().await?;
        let entry = append_entry(&txn, input).await?;
        txn.commit().await?;
        Ok(entry)
    }

    /// Deletes every entry of `account` tagged with `reference`.
    ///
    /// Later entries keep their stored balances; the cache is re-derived from
    /// the newest surviving entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn reverse_all_for(
        &self,
        account: AccountRef,
        reference: Reference,
    ) -> Result<Vec<LedgerEntry>, FinanceError> {
        let txn = self.db.begin().await?;
        let removed = reverse_entries(&txn, account, reference).await?;
        txn.commit().await?;
        Ok(removed)
    }

    /// `balance_after` of the newest entry, or zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_balance(
        &self,
        account: AccountRef,
        currency: &CurrencyCode,
    ) -> Result<Decimal, FinanceError> {
        Ok(latest_entry(&self.db, account, currency)
            .await?
            .map_or(Decimal::ZERO, |latest| latest.balance_after))
    }

    /// Cached balances of an account, per currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balances(
        &self,
        account: AccountRef,
    ) -> Result<BTreeMap<CurrencyCode, Decimal>, FinanceError> {
        let rows = ledger_balances::Entity::find()
            .filter(ledger_balances::Column::AccountKind.eq(account.account_kind()))
            .filter(ledger_balances::Column::AccountId.eq(account.account_id()))
            .all(&self.db)
            .await?;

        let mut balances = BTreeMap::new();
        for row in rows {
            balances.insert(stored_currency(&row.currency)?, row.current_balance);
        }
        Ok(balances)
    }

    /// All entries of an account in creation order with per-currency totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn statement(&self, account: AccountRef) -> Result<Statement, FinanceError> {
        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
            .filter(ledger_entries::Column::AccountId.eq(account.account_id()))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::Currency)
            .order_by_asc(ledger_entries::Column::Version)
            .all(&self.db)
            .await?;

        let entries = rows
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Statement::from_entries(account, entries)?)
    }

    /// Entries of an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_account(
        &self,
        account: AccountRef,
    ) -> Result<Vec<LedgerEntry>, FinanceError> {
        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
            .filter(ledger_entries::Column::AccountId.eq(account.account_id()))
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Version)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// One page of an account's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_page(
        &self,
        account: AccountRef,
        page: &PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, FinanceError> {
        let query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
            .filter(ledger_entries::Column::AccountId.eq(account.account_id()));

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Version)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let entries = rows
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::new(
            entries,
            page.page.max(1),
            page.page_size(),
            total,
        ))
    }

    /// Entries on any account tagged with `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_reference(
        &self,
        reference: Reference,
    ) -> Result<Vec<LedgerEntry>, FinanceError> {
        let rows = ledger_entries::Entity::find()
            .filter(
                ledger_entries::Column::ReferenceKind
                    .eq(crate::entities::sea_orm_active_enums::ReferenceKind::from(reference.kind)),
            )
            .filter(ledger_entries::Column::ReferenceId.eq(reference.id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Replays an `(account, currency)` chain from zero and compares it with
    /// the stored balances and the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_chain(
        &self,
        account: AccountRef,
        currency: &CurrencyCode,
    ) -> Result<ChainVerification, FinanceError> {
        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
            .filter(ledger_entries::Column::AccountId.eq(account.account_id()))
            .filter(ledger_entries::Column::Currency.eq(currency.as_str()))
            .order_by_asc(ledger_entries::Column::Version)
            .all(&self.db)
            .await?;

        let links: Vec<ChainLink> = rows
            .iter()
            .map(|row| ChainLink {
                entry_id: row.id,
                version: row.version,
                direction: row.direction.into(),
                amount: row.amount,
                balance_before: row.balance_before,
                balance_after: row.balance_after,
            })
            .collect();
        let report = verify_chain(&links)?;

        let cached_balance = find_balance_row(&self.db, account, currency)
            .await?
            .map_or(Decimal::ZERO, |row| row.current_balance);
        let is_consistent = report.is_consistent() && cached_balance == report.last_stored_balance;

        Ok(ChainVerification {
            report,
            cached_balance,
            is_consistent,
        })
    }
}

/// Appends one entry on `conn`, which should be an open transaction.
///
/// Treasury accounts also get their `current_balance` column refreshed.
pub(crate) async fn append_entry<C: ConnectionTrait>(
    conn: &C,
    input: NewLedgerEntry,
) -> Result<LedgerEntry, FinanceError> {
    input.validate()?;

    let balance_row = lock_balance_row(conn, input.account, &input.currency).await?;
    let latest = latest_entry(conn, input.account, &input.currency)
        .await?
        .map(|model| RunningBalance {
            version: model.version,
            balance_before: model.balance_before,
            balance_after: model.balance_after,
        });
    let running = RunningBalance::after(latest.as_ref(), input.direction, input.amount)?;

    let now = Utc::now().into();
    let model = ledger_entries::ActiveModel {
        id: Set(Uuid::now_v7()),
        account_kind: Set(input.account.account_kind().to_string()),
        account_id: Set(input.account.account_id()),
        direction: Set(input.direction.into()),
        amount: Set(input.amount),
        currency: Set(input.currency.as_str().to_string()),
        balance_before: Set(running.balance_before),
        balance_after: Set(running.balance_after),
        version: Set(running.version),
        reference_kind: Set(input.reference.kind.into()),
        reference_id: Set(input.reference.id),
        description: Set(input.description),
        created_by: Set(input.created_by.map(|user| user.into_inner())),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(FinanceError::on_chain_insert)?;

    let mut cache: ledger_balances::ActiveModel = balance_row.into();
    cache.current_balance = Set(running.balance_after);
    cache.version = Set(running.version);
    cache.updated_at = Set(now);
    cache.update(conn).await?;

    if let AccountRef::Treasury { id } = input.account {
        refresh_treasury_balance(conn, id, running.balance_after).await?;
    }

    debug!(
        account = %input.account,
        currency = %input.currency,
        version = running.version,
        balance_after = %running.balance_after,
        "Ledger entry appended"
    );

    Ok(entry_from_model(model)?)
}

/// Deletes entries of `account` tagged with `reference` on `conn` and
/// re-derives the caches of the affected currencies.
pub(crate) async fn reverse_entries<C: ConnectionTrait>(
    conn: &C,
    account: AccountRef,
    reference: Reference,
) -> Result<Vec<LedgerEntry>, FinanceError> {
    let matching = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
        .filter(ledger_entries::Column::AccountId.eq(account.account_id()))
        .filter(
            ledger_entries::Column::ReferenceKind
                .eq(crate::entities::sea_orm_active_enums::ReferenceKind::from(reference.kind)),
        )
        .filter(ledger_entries::Column::ReferenceId.eq(reference.id))
        .order_by_asc(ledger_entries::Column::Version)
        .all(conn)
        .await?;

    if matching.is_empty() {
        return Ok(Vec::new());
    }

    let mut currencies: Vec<CurrencyCode> = Vec::new();
    for row in &matching {
        let currency = stored_currency(&row.currency)?;
        if !currencies.contains(&currency) {
            currencies.push(currency);
        }
    }
    currencies.sort();

    let mut balance_rows = Vec::with_capacity(currencies.len());
    for currency in &currencies {
        balance_rows.push(lock_balance_row(conn, account, currency).await?);
    }

    ledger_entries::Entity::delete_many()
        .filter(ledger_entries::Column::Id.is_in(matching.iter().map(|row| row.id)))
        .exec(conn)
        .await?;

    let now = Utc::now().into();
    for (currency, balance_row) in currencies.iter().zip(balance_rows) {
        let survivor = latest_entry(conn, account, currency).await?;
        let (version, balance) =
            survivor.map_or((0, Decimal::ZERO), |row| (row.version, row.balance_after));

        let mut cache: ledger_balances::ActiveModel = balance_row.into();
        cache.current_balance = Set(balance);
        cache.version = Set(version);
        cache.updated_at = Set(now);
        cache.update(conn).await?;

        if let AccountRef::Treasury { id } = account {
            refresh_treasury_balance(conn, id, balance).await?;
        }
    }

    debug!(
        account = %account,
        reference_kind = reference.kind.as_str(),
        reference_id = %reference.id,
        removed = matching.len(),
        "Ledger entries reversed"
    );

    matching
        .into_iter()
        .map(|row| entry_from_model(row).map_err(FinanceError::from))
        .collect()
}

/// Newest entry of an `(account, currency)` chain.
async fn latest_entry<C: ConnectionTrait>(
    conn: &C,
    account: AccountRef,
    currency: &CurrencyCode,
) -> Result<Option<ledger_entries::Model>, FinanceError> {
    Ok(ledger_entries::Entity::find()
        .filter(ledger_entries::Column::AccountKind.eq(account.account_kind()))
        .filter(ledger_entries::Column::AccountId.eq(account.account_id()))
        .filter(ledger_entries::Column::Currency.eq(currency.as_str()))
        .order_by_desc(ledger_entries::Column::Version)
        .limit(1)
        .one(conn)
        .await?)
}

async fn find_balance_row<C: ConnectionTrait>(
    conn: &C,
    account: AccountRef,
    currency: &CurrencyCode,
) -> Result<Option<ledger_balances::Model>, FinanceError> {
    Ok(ledger_balances::Entity::find()
        .filter(ledger_balances::Column::AccountKind.eq(account.account_kind()))
        .filter(ledger_balances::Column::AccountId.eq(account.account_id()))
        .filter(ledger_balances::Column::Currency.eq(currency.as_str()))
        .one(conn)
        .await?)
}

/// Ensures the balance row exists, then selects it for update.
async fn lock_balance_row<C: ConnectionTrait>(
    conn: &C,
    account: AccountRef,
    currency: &CurrencyCode,
) -> Result<ledger_balances::Model, FinanceError> {
    let seed = ledger_balances::ActiveModel {
        id: Set(Uuid::now_v7()),
        account_kind: Set(account.account_kind().to_string()),
        account_id: Set(account.account_id()),
        currency: Set(currency.as_str().to_string()),
        current_balance: Set(Decimal::ZERO),
        version: Set(0),
        updated_at: Set(Utc::now().into()),
    };
    ledger_balances::Entity::insert(seed)
        .on_conflict(
            OnConflict::columns([
                ledger_balances::Column::AccountKind,
                ledger_balances::Column::AccountId,
                ledger_balances::Column::Currency,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let select = ledger_balances::Entity::find()
        .filter(ledger_balances::Column::AccountKind.eq(account.account_kind()))
        .filter(ledger_balances::Column::AccountId.eq(account.account_id()))
        .filter(ledger_balances::Column::Currency.eq(currency.as_str()));

    for_update(select, conn)
        .one(conn)
        .await?
        .ok_or_else(|| {
            FinanceError::Domain(mizan_core::LedgerError::Internal(format!(
                "Balance row missing for {account} {currency}"
            )))
        })
}

async fn refresh_treasury_balance<C: ConnectionTrait>(
    conn: &C,
    treasury_id: TreasuryId,
    balance: Decimal,
) -> Result<(), FinanceError> {
    treasuries::Entity::update_many()
        .col_expr(
            treasuries::Column::CurrentBalance,
            sea_orm::sea_query::Expr::value(balance),
        )
        .col_expr(
            treasuries::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(
                Utc::now(),
            )),
        )
        .filter(treasuries::Column::Id.eq(treasury_id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}
