//! Party registry and per-currency sub-ledgers.

use chrono::Utc;
use mizan_core::ledger::{
    AccountRef, Direction, LedgerEntry, NewLedgerEntry, PartyKind, Reference, Statement,
};
use mizan_core::party::{AccountSummary, Party};
use mizan_core::LedgerError;
use mizan_shared::types::{CurrencyCode, PartyId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;

use super::ledger::{append_entry, LedgerRepository};
use crate::entities::parties;
use crate::error::FinanceError;

/// A claim or settlement posting on a party account.
#[derive(Debug, Clone, Deserialize)]
pub struct PartyPosting {
    /// Positive amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// Owning document.
    pub reference: Reference,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Party repository.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    db: DatabaseConnection,
}

impl PartyRepository {
    /// Creates a new party repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a party.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name.
    pub async fn create(&self, kind: PartyKind, name: &str) -> Result<Party, FinanceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("Party name is required").into());
        }

        let party = parties::ActiveModel {
            id: Set(PartyId::new().into_inner()),
            kind: Set(kind.into()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(party_id = %party.id, kind = ?kind, "Party created");
        Ok(to_party(party))
    }

    /// Gets a party by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist.
    pub async fn get(&self, id: PartyId) -> Result<Party, FinanceError> {
        Ok(to_party(find_party(&self.db, id).await?))
    }

    /// Books a CREDIT: the party's claim against the business grows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown party or a validation error for a
    /// non-positive amount.
    pub async fn record_claim_increase(
        &self,
        party_id: PartyId,
        posting: PartyPosting,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        self.post(party_id, Direction::Credit, posting, created_by)
            .await
    }

    /// Books a DEBIT: the party's claim shrinks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown party or a validation error for a
    /// non-positive amount.
    pub async fn record_settlement(
        &self,
        party_id: PartyId,
        posting: PartyPosting,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        self.post(party_id, Direction::Debit, posting, created_by)
            .await
    }

    async fn post(
        &self,
        party_id: PartyId,
        direction: Direction,
        posting: PartyPosting,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        let txn = self.db.begin().await?;
        let account = party_account(&txn, party_id).await?;
        let entry = append_entry(
            &txn,
            NewLedgerEntry {
                account,
                direction,
                amount: posting.amount,
                currency: posting.currency,
                reference: posting.reference,
                description: posting.description,
                created_by,
            },
        )
        .await?;
        txn.commit().await?;

        info!(
            %party_id,
            direction = ?direction,
            amount = %entry.amount,
            currency = %entry.currency,
            balance_after = %entry.balance_after,
            "Party posting committed"
        );
        Ok(entry)
    }

    /// Per-currency position of a party.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist.
    pub async fn account_summary(&self, party_id: PartyId) -> Result<AccountSummary, FinanceError> {
        let account = party_account(&self.db, party_id).await?;
        let ledger = LedgerRepository::new(self.db.clone());
        let balances = ledger.balances(account).await?;
        let statement = ledger.statement(account).await?;

        Ok(AccountSummary::new(party_id, balances, statement.totals))
    }

    /// Ledger statement of a party.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist.
    pub async fn statement(&self, party_id: PartyId) -> Result<Statement, FinanceError> {
        let account = party_account(&self.db, party_id).await?;
        LedgerRepository::new(self.db.clone())
            .statement(account)
            .await
    }
}

async fn find_party<C: ConnectionTrait>(
    conn: &C,
    id: PartyId,
) -> Result<parties::Model, FinanceError> {
    Ok(parties::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Party", id))?)
}

/// Resolves the ledger account of a registered party.
pub(crate) async fn party_account<C: ConnectionTrait>(
    conn: &C,
    id: PartyId,
) -> Result<AccountRef, FinanceError> {
    let party = find_party(conn, id).await?;
    Ok(AccountRef::party(party.kind.into(), id))
}

fn to_party(model: parties::Model) -> Party {
    Party {
        id: PartyId::from_uuid(model.id),
        kind: model.kind.into(),
        name: model.name,
    }
}
