//! Treasury repository: cash and bank accounts and their movements.

use chrono::Utc;
use mizan_core::ledger::{AccountRef, Direction, LedgerEntry, NewLedgerEntry, Reference, ReferenceKind};
use mizan_core::treasury::{NewTreasury, TreasuryInfo, TreasuryKind, TreasuryService};
use mizan_core::LedgerError;
use mizan_shared::types::{CompanyId, PageRequest, PageResponse, TreasuryId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::company::find_company;
use super::ledger::{append_entry, LedgerRepository};
use crate::convert::stored_currency;
use crate::entities::treasuries;
use crate::error::FinanceError;
use crate::lock::for_update;
use crate::settings::LedgerSettings;

/// Filter options for listing treasuries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreasuryFilter {
    /// Only this kind.
    pub kind: Option<TreasuryKind>,
    /// Only treasuries of this company.
    pub company_id: Option<Uuid>,
    /// Skip deactivated treasuries.
    #[serde(default)]
    pub active_only: bool,
}

/// A deposit or withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryMovement {
    /// Positive amount in the treasury's currency.
    pub amount: Decimal,
    /// Source document.
    pub reference: Reference,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// A transfer between two treasuries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    /// Treasury paying out.
    pub from_treasury_id: TreasuryId,
    /// Treasury receiving.
    pub to_treasury_id: TreasuryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Both sides of a completed transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    /// Id shared by both entries' `TRANSFER` reference.
    pub transfer_id: Uuid,
    /// DEBIT on the source treasury.
    pub outgoing: LedgerEntry,
    /// CREDIT on the destination treasury.
    pub incoming: LedgerEntry,
}

/// Treasury repository.
#[derive(Debug, Clone)]
pub struct TreasuryRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl TreasuryRepository {
    /// Creates a new treasury repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Creates a treasury with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing kind-specific fields, or
    /// `NotFound` for an unknown company.
    pub async fn create(&self, input: NewTreasury) -> Result<treasuries::Model, FinanceError> {
        TreasuryService::validate_new(&input)?;

        if let Some(company_id) = input.company_id {
            find_company(&self.db, company_id).await?;
        }

        let currency = input
            .currency
            .unwrap_or_else(|| self.settings.base_currency.clone());
        let now = Utc::now().into();
        let treasury = treasuries::ActiveModel {
            id: Set(TreasuryId::new().into_inner()),
            name: Set(input.name.trim().to_string()),
            kind: Set(input.kind.into()),
            company_id: Set(input.company_id.map(CompanyId::into_inner)),
            bank_name: Set(input.bank_name),
            currency: Set(currency.as_str().to_string()),
            current_balance: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(treasury_id = %treasury.id, name = %treasury.name, "Treasury created");
        Ok(treasury)
    }

    /// Gets a treasury by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the treasury does not exist.
    pub async fn get(&self, id: TreasuryId) -> Result<treasuries::Model, FinanceError> {
        Ok(treasuries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::not_found("Treasury", id))?)
    }

    /// Lists treasuries ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: TreasuryFilter) -> Result<Vec<treasuries::Model>, FinanceError> {
        let mut query = treasuries::Entity::find();

        if let Some(kind) = filter.kind {
            query = query.filter(
                treasuries::Column::Kind
                    .eq(crate::entities::sea_orm_active_enums::TreasuryKind::from(kind)),
            );
        }

        if let Some(company_id) = filter.company_id {
            query = query.filter(treasuries::Column::CompanyId.eq(company_id));
        }

        if filter.active_only {
            query = query.filter(treasuries::Column::IsActive.eq(true));
        }

        Ok(query
            .order_by_asc(treasuries::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Activates or deactivates a treasury.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the treasury does not exist.
    pub async fn set_active(
        &self,
        id: TreasuryId,
        is_active: bool,
    ) -> Result<treasuries::Model, FinanceError> {
        let treasury = self.get(id).await?;
        let mut model: treasuries::ActiveModel = treasury.into();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now().into());
        let updated = model.update(&self.db).await?;

        info!(treasury_id = %id, is_active, "Treasury activation changed");
        Ok(updated)
    }

    /// Deposits money into a treasury (CREDIT).
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `NotFound`, or `InactiveAccount`.
    pub async fn deposit(
        &self,
        id: TreasuryId,
        movement: TreasuryMovement,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        let txn = self.db.begin().await?;
        let entry = deposit_in(&txn, id, movement, created_by).await?;
        txn.commit().await?;

        info!(
            treasury_id = %id,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "Treasury deposit committed"
        );
        Ok(entry)
    }

    /// Withdraws money from a treasury (DEBIT).
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `NotFound`, `InactiveAccount`, or
    /// `InsufficientFunds`.
    pub async fn withdraw(
        &self,
        id: TreasuryId,
        movement: TreasuryMovement,
        created_by: Option<UserId>,
    ) -> Result<LedgerEntry, FinanceError> {
        let txn = self.db.begin().await?;
        let entry = withdraw_in(&txn, id, movement, created_by).await?;
        txn.commit().await?;

        info!(
            treasury_id = %id,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "Treasury withdrawal committed"
        );
        Ok(entry)
    }

    /// Moves money between two treasuries in one transaction.
    ///
    /// Both rows are locked in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns `SameAccount`, `NotFound`, `InactiveAccount`, or
    /// `InsufficientFunds`.
    pub async fn transfer(
        &self,
        input: TransferInput,
        created_by: Option<UserId>,
    ) -> Result<TransferResult, FinanceError> {
        if input.from_treasury_id == input.to_treasury_id {
            return Err(LedgerError::SameAccount(input.from_treasury_id.into_inner()).into());
        }

        let txn = self.db.begin().await?;

        let (first, second) = if input.from_treasury_id < input.to_treasury_id {
            (input.from_treasury_id, input.to_treasury_id)
        } else {
            (input.to_treasury_id, input.from_treasury_id)
        };
        let first_info = lock_treasury(&txn, first).await?;
        let second_info = lock_treasury(&txn, second).await?;
        let (from, to) = if first == input.from_treasury_id {
            (first_info, second_info)
        } else {
            (second_info, first_info)
        };

        TreasuryService::check_transfer(&from, &to, input.amount)?;

        let transfer_id = Uuid::now_v7();
        let reference = Reference::new(ReferenceKind::Transfer, transfer_id);
        let outgoing = append_entry(
            &txn,
            NewLedgerEntry {
                account: AccountRef::treasury(from.id),
                direction: Direction::Debit,
                amount: input.amount,
                currency: from.currency.clone(),
                reference,
                description: input.description.clone(),
                created_by,
            },
        )
        .await?;
        let incoming = append_entry(
            &txn,
            NewLedgerEntry {
                account: AccountRef::treasury(to.id),
                direction: Direction::Credit,
                amount: input.amount,
                currency: to.currency.clone(),
                reference,
                description: input.description,
                created_by,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            %transfer_id,
            from = %from.id,
            to = %to.id,
            amount = %input.amount,
            "Treasury transfer committed"
        );

        Ok(TransferResult {
            transfer_id,
            outgoing,
            incoming,
        })
    }

    /// Entries of a treasury, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the treasury does not exist.
    pub async fn transactions(&self, id: TreasuryId) -> Result<Vec<LedgerEntry>, FinanceError> {
        self.get(id).await?;
        LedgerRepository::new(self.db.clone())
            .entries_for_account(AccountRef::treasury(id))
            .await
    }

    /// One page of the treasury's movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the treasury does not exist.
    pub async fn transactions_page(
        &self,
        id: TreasuryId,
        page: &PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, FinanceError> {
        self.get(id).await?;
        LedgerRepository::new(self.db.clone())
            .entries_page(AccountRef::treasury(id), page)
            .await
    }
}

/// Locks a treasury row and reads what the movement rules need.
pub(crate) async fn lock_treasury<C: ConnectionTrait>(
    conn: &C,
    id: TreasuryId,
) -> Result<TreasuryInfo, FinanceError> {
    let model = for_update(treasuries::Entity::find_by_id(id.into_inner()), conn)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Treasury", id))?;

    Ok(TreasuryInfo {
        id,
        is_active: model.is_active,
        current_balance: model.current_balance,
        currency: stored_currency(&model.currency)?,
    })
}

/// Deposit on an open transaction.
pub(crate) async fn deposit_in<C: ConnectionTrait>(
    conn: &C,
    id: TreasuryId,
    movement: TreasuryMovement,
    created_by: Option<UserId>,
) -> Result<LedgerEntry, FinanceError> {
    let treasury = lock_treasury(conn, id).await?;
    TreasuryService::check_deposit(&treasury, movement.amount)?;
    append_entry(
        conn,
        NewLedgerEntry {
            account: AccountRef::treasury(id),
            direction: Direction::Credit,
            amount: movement.amount,
            currency: treasury.currency,
            reference: movement.reference,
            description: movement.description,
            created_by,
        },
    )
    .await
}

/// Withdrawal on an open transaction.
pub(crate) async fn withdraw_in<C: ConnectionTrait>(
    conn: &C,
    id: TreasuryId,
    movement: TreasuryMovement,
    created_by: Option<UserId>,
) -> Result<LedgerEntry, FinanceError> {
    let treasury = lock_treasury(conn, id).await?;
    TreasuryService::check_withdrawal(&treasury, movement.amount)?;
    append_entry(
        conn,
        NewLedgerEntry {
            account: AccountRef::treasury(id),
            direction: Direction::Debit,
            amount: movement.amount,
            currency: treasury.currency,
            reference: movement.reference,
            description: movement.description,
            created_by,
        },
    )
    .await
}
