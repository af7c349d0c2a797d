//! Payment obligation and installment repository.
//!
//! Every write locks the obligation row first, so concurrent installments on
//! one obligation are serialized and cannot jointly overpay.

use chrono::Utc;
use mizan_core::currency::CurrencyService;
use mizan_core::ledger::{
    AccountRef, Direction, LedgerEntry, NewLedgerEntry, Reference, ReferenceKind,
};
use mizan_core::obligation::{
    NewInstallment, NewObligation, ObligationService, ObligationState, ObligationStatus,
};
use mizan_core::treasury::TreasuryService;
use mizan_core::LedgerError;
use mizan_shared::types::{CurrencyCode, InstallmentId, ObligationId, PartyId, TreasuryId, UserId};
use mizan_shared::ReversalPolicy;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ledger::{append_entry, reverse_entries};
use super::party::party_account;
use super::treasury::{lock_treasury, withdraw_in, TreasuryMovement};
use crate::convert::stored_currency;
use crate::entities::sea_orm_active_enums as db;
use crate::entities::{installments, payment_obligations};
use crate::error::FinanceError;
use crate::lock::for_update;
use crate::settings::LedgerSettings;

/// Filter options for listing obligations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObligationFilter {
    /// Only obligations owed to this party.
    pub party_id: Option<PartyId>,
    /// Only obligations in this status.
    pub status: Option<ObligationStatus>,
}

/// An obligation with its installments.
#[derive(Debug, Clone, Serialize)]
pub struct ObligationView {
    /// The obligation row.
    pub obligation: payment_obligations::Model,
    /// Installments, oldest first.
    pub installments: Vec<installments::Model>,
    /// Sum of installment amounts.
    pub paid: Decimal,
    /// Amount still owed.
    pub remaining: Decimal,
}

/// Outcome of a recorded installment.
#[derive(Debug, Clone, Serialize)]
pub struct InstallmentReceipt {
    /// The stored installment.
    pub installment: installments::Model,
    /// The obligation after the installment.
    pub obligation: payment_obligations::Model,
    /// Amount still owed.
    pub remaining: Decimal,
    /// Settlement DEBIT on the party, when the obligation has one.
    pub party_entry: Option<LedgerEntry>,
    /// Withdrawal from the paying treasury, when one was named.
    pub treasury_entry: Option<LedgerEntry>,
}

/// Full settlement request.
#[derive(Debug, Clone, Deserialize)]
pub struct PayInFull {
    /// Treasury to withdraw the base-currency equivalent from.
    pub treasury_id: TreasuryId,
    /// Settlement-time rate for a foreign obligation.
    pub exchange_rate: Option<Decimal>,
}

/// Payment obligation repository.
#[derive(Debug, Clone)]
pub struct ObligationRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl ObligationRepository {
    /// Creates a new obligation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Creates a `PENDING` obligation.
    ///
    /// When `record_claim` is set, the party's claim `(PURCHASE, obligation_id)`
    /// is credited in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad amounts or rates, or `NotFound` for
    /// an unknown party.
    pub async fn create(
        &self,
        input: NewObligation,
        created_by: Option<UserId>,
    ) -> Result<payment_obligations::Model, FinanceError> {
        let txn = self.db.begin().await?;
        let (obligation, _) = create_in(&txn, &self.settings, input, created_by).await?;
        txn.commit().await?;

        info!(
            obligation_id = %obligation.id,
            amount = %obligation.total_amount,
            currency = %obligation.currency,
            "Obligation created"
        );
        Ok(obligation)
    }

    /// Gets an obligation with its installments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the obligation does not exist.
    pub async fn get(&self, id: ObligationId) -> Result<ObligationView, FinanceError> {
        let obligation = find_obligation(&self.db, id).await?;
        let installments = installments_of(&self.db, id).await?;
        let paid = sum_paid(&installments);
        let remaining = ObligationService::remaining(obligation.total_amount, paid);

        Ok(ObligationView {
            obligation,
            installments,
            paid,
            remaining,
        })
    }

    /// Lists obligations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: ObligationFilter,
    ) -> Result<Vec<payment_obligations::Model>, FinanceError> {
        let mut query = payment_obligations::Entity::find();

        if let Some(party_id) = filter.party_id {
            query = query.filter(payment_obligations::Column::PartyId.eq(party_id.into_inner()));
        }

        if let Some(status) = filter.status {
            query = query.filter(
                payment_obligations::Column::Status.eq(db::ObligationStatus::from(status)),
            );
        }

        Ok(query
            .order_by_desc(payment_obligations::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Installments of an obligation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the obligation does not exist.
    pub async fn list_installments(
        &self,
        id: ObligationId,
    ) -> Result<Vec<installments::Model>, FinanceError> {
        find_obligation(&self.db, id).await?;
        installments_of(&self.db, id).await
    }

    /// Records a partial payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the obligation is `PENDING`, `Overpayment`
    /// when the amount exceeds what is owed, and any treasury error from the
    /// withdrawal.
    pub async fn add_installment(
        &self,
        id: ObligationId,
        input: NewInstallment,
        created_by: Option<UserId>,
    ) -> Result<InstallmentReceipt, FinanceError> {
        let txn = self.db.begin().await?;

        let obligation = lock_obligation(&txn, id).await?;
        let state = state_of(&txn, &obligation).await?;
        let plan = ObligationService::plan_installment(&state, input.amount)?;
        let currency = stored_currency(&obligation.currency)?;
        let rate = CurrencyService::effective_rate(
            &currency,
            &self.settings.base_currency,
            Some(input.exchange_rate.unwrap_or(obligation.exchange_rate)),
        )?;

        let receipt = settle_in(
            &txn,
            &self.settings,
            obligation,
            Settlement {
                amount: plan.amount,
                remaining: plan.remaining,
                status: plan.status,
                exchange_rate: rate,
                treasury_id: input.treasury_id,
                payment_method: input.payment_method,
                reference_number: input.reference_number,
            },
            created_by,
        )
        .await?;

        txn.commit().await?;

        info!(
            obligation_id = %id,
            installment_id = %receipt.installment.id,
            amount = %receipt.installment.amount,
            remaining = %receipt.remaining,
            "Installment recorded"
        );
        Ok(receipt)
    }

    /// Settles the whole remaining amount in one installment.
    ///
    /// A fresh rate on a foreign obligation replaces the stored rate and base
    /// amount before the installment is booked.
    ///
    /// # Errors
    ///
    /// As [`Self::add_installment`]; an obligation with nothing left to pay is
    /// reported as `InvalidState`.
    pub async fn pay_in_full(
        &self,
        id: ObligationId,
        input: PayInFull,
        created_by: Option<UserId>,
    ) -> Result<InstallmentReceipt, FinanceError> {
        let txn = self.db.begin().await?;

        let mut obligation = lock_obligation(&txn, id).await?;
        let state = state_of(&txn, &obligation).await?;
        let plan = ObligationService::plan_full_payment(&state)?;
        let currency = stored_currency(&obligation.currency)?;

        if let Some(rebind) = ObligationService::rebind_rate(
            obligation.total_amount,
            &currency,
            &self.settings.base_currency,
            input.exchange_rate,
        )? {
            let mut model: payment_obligations::ActiveModel = obligation.into();
            model.exchange_rate = Set(rebind.exchange_rate);
            model.base_amount = Set(rebind.base_amount);
            model.updated_at = Set(Utc::now().into());
            obligation = model.update(&txn).await?;

            info!(
                obligation_id = %id,
                exchange_rate = %rebind.exchange_rate,
                base_amount = %rebind.base_amount,
                "Obligation rate rebound at settlement"
            );
        }

        let rate = CurrencyService::effective_rate(
            &currency,
            &self.settings.base_currency,
            Some(obligation.exchange_rate),
        )?;

        let receipt = settle_in(
            &txn,
            &self.settings,
            obligation,
            Settlement {
                amount: plan.amount,
                remaining: plan.remaining,
                status: plan.status,
                exchange_rate: rate,
                treasury_id: Some(input.treasury_id),
                payment_method: None,
                reference_number: None,
            },
            created_by,
        )
        .await?;

        txn.commit().await?;

        info!(
            obligation_id = %id,
            installment_id = %receipt.installment.id,
            amount = %receipt.installment.amount,
            "Obligation paid in full"
        );
        Ok(receipt)
    }

    /// Deletes an installment and its party settlement entry.
    ///
    /// Under the strict reversal policy the treasury withdrawal is
    /// compensated with an `(ADJUSTMENT, installment_id)` credit; otherwise it
    /// stays on the books.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown installment, or `InvalidState` when
    /// the obligation is cancelled.
    pub async fn delete_installment(
        &self,
        installment_id: InstallmentId,
        created_by: Option<UserId>,
    ) -> Result<payment_obligations::Model, FinanceError> {
        let txn = self.db.begin().await?;

        let installment = installments::Entity::find_by_id(installment_id.into_inner())
            .one(&txn)
            .await?
            .ok_or_else(|| LedgerError::not_found("Installment", installment_id))?;
        let obligation_id = ObligationId::from_uuid(installment.obligation_id);
        let obligation = lock_obligation(&txn, obligation_id).await?;
        let state = state_of(&txn, &obligation).await?;
        let status = ObligationService::status_after_removal(&state, installment.amount)?;

        self.undo_installment(&txn, &obligation, &installment, created_by)
            .await?;

        let mut model: payment_obligations::ActiveModel = obligation.into();
        model.status = Set(status.into());
        if status == ObligationStatus::Pending {
            model.paid_at = Set(None);
        }
        model.updated_at = Set(Utc::now().into());
        let obligation = model.update(&txn).await?;

        txn.commit().await?;

        info!(
            %obligation_id,
            %installment_id,
            amount = %installment.amount,
            status = %status,
            "Installment deleted"
        );
        Ok(obligation)
    }

    /// Cancels a `PENDING` obligation.
    ///
    /// Party entries tagged `(PURCHASE, id)` and `(RETURN, id)` are reversed.
    /// Under the strict reversal policy every installment is undone as
    /// [`Self::delete_installment`] would: its party settlement is reversed,
    /// its withdrawal compensated and its row removed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty reason, or `InvalidState`
    /// unless the obligation is `PENDING`.
    pub async fn cancel(
        &self,
        id: ObligationId,
        reason: &str,
        created_by: Option<UserId>,
    ) -> Result<payment_obligations::Model, FinanceError> {
        let txn = self.db.begin().await?;

        let obligation = lock_obligation(&txn, id).await?;
        let state = state_of(&txn, &obligation).await?;
        ObligationService::validate_cancel(&state, reason)?;

        let mut reversed = 0;
        if let Some(party_id) = obligation.party_id {
            let account = party_account(&txn, PartyId::from_uuid(party_id)).await?;
            for kind in [ReferenceKind::Purchase, ReferenceKind::Return] {
                reversed += reverse_entries(&txn, account, Reference::new(kind, id))
                    .await?
                    .len();
            }
        }

        if self.settings.reversal_policy == ReversalPolicy::Strict {
            for installment in installments_of(&txn, id).await? {
                self.undo_installment(&txn, &obligation, &installment, created_by)
                    .await?;
            }
        }

        let mut model: payment_obligations::ActiveModel = obligation.into();
        model.status = Set(ObligationStatus::Cancelled.into());
        model.cancel_reason = Set(Some(reason.trim().to_string()));
        model.updated_at = Set(Utc::now().into());
        let obligation = model.update(&txn).await?;

        txn.commit().await?;

        info!(obligation_id = %id, reversed, "Obligation cancelled");
        Ok(obligation)
    }

    /// Reverses an installment's party settlement, compensates its treasury
    /// withdrawal under the strict policy and deletes the row.
    async fn undo_installment<C: ConnectionTrait>(
        &self,
        conn: &C,
        obligation: &payment_obligations::Model,
        installment: &installments::Model,
        created_by: Option<UserId>,
    ) -> Result<(), FinanceError> {
        if let Some(party_id) = obligation.party_id {
            let account = party_account(conn, PartyId::from_uuid(party_id)).await?;
            reverse_entries(
                conn,
                account,
                Reference::new(ReferenceKind::Payment, installment.id),
            )
            .await?;
        }

        if self.settings.reversal_policy == ReversalPolicy::Strict {
            let currency = stored_currency(&obligation.currency)?;
            compensate_withdrawal(
                conn,
                &self.settings.base_currency,
                &currency,
                installment,
                created_by,
            )
            .await?;
        }

        installments::Entity::delete_by_id(installment.id)
            .exec(conn)
            .await?;
        Ok(())
    }
}

/// What [`settle_in`] books for one installment.
struct Settlement {
    amount: Decimal,
    remaining: Decimal,
    status: ObligationStatus,
    exchange_rate: Decimal,
    treasury_id: Option<TreasuryId>,
    payment_method: Option<String>,
    reference_number: Option<String>,
}

/// Creates an obligation on an open transaction, crediting the party's claim
/// when requested.
pub(crate) async fn create_in<C: ConnectionTrait>(
    conn: &C,
    settings: &LedgerSettings,
    input: NewObligation,
    created_by: Option<UserId>,
) -> Result<(payment_obligations::Model, Option<LedgerEntry>), FinanceError> {
    let rate = ObligationService::validate_new(&input, &settings.base_currency)?;
    let account = match input.party_id {
        Some(party_id) => Some(party_account(conn, party_id).await?),
        None => None,
    };
    let base_amount =
        CurrencyService::to_base(input.amount, &input.currency, &settings.base_currency, rate)?;

    let now = Utc::now().into();
    let obligation = payment_obligations::ActiveModel {
        id: Set(ObligationId::new().into_inner()),
        party_id: Set(input.party_id.map(PartyId::into_inner)),
        total_amount: Set(input.amount),
        currency: Set(input.currency.as_str().to_string()),
        exchange_rate: Set(rate),
        base_amount: Set(base_amount),
        status: Set(db::ObligationStatus::Pending),
        origin_kind: Set(input.origin.kind.into()),
        origin_id: Set(input.origin.id),
        cancel_reason: Set(None),
        created_by: Set(created_by.map(UserId::into_inner)),
        created_at: Set(now),
        paid_at: Set(None),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let claim = match account {
        Some(account) if input.record_claim => Some(
            book_claim(
                conn,
                account,
                &obligation,
                input.currency,
                format!("Claim for obligation {}", obligation.id),
                created_by,
            )
            .await?,
        ),
        _ => None,
    };

    Ok((obligation, claim))
}

/// Credits the party's claim `(PURCHASE, obligation_id)`.
pub(crate) async fn book_claim<C: ConnectionTrait>(
    conn: &C,
    account: AccountRef,
    obligation: &payment_obligations::Model,
    currency: CurrencyCode,
    description: String,
    created_by: Option<UserId>,
) -> Result<LedgerEntry, FinanceError> {
    append_entry(
        conn,
        NewLedgerEntry {
            account,
            direction: Direction::Credit,
            amount: obligation.total_amount,
            currency,
            reference: Reference::new(ReferenceKind::Purchase, obligation.id),
            description,
            created_by,
        },
    )
    .await
}

/// Books one installment against a locked obligation.
async fn settle_in<C: ConnectionTrait>(
    conn: &C,
    settings: &LedgerSettings,
    obligation: payment_obligations::Model,
    settlement: Settlement,
    created_by: Option<UserId>,
) -> Result<InstallmentReceipt, FinanceError> {
    let currency = stored_currency(&obligation.currency)?;
    let base_amount = CurrencyService::to_base(
        settlement.amount,
        &currency,
        &settings.base_currency,
        settlement.exchange_rate,
    )?;
    let payout = match settlement.treasury_id {
        Some(treasury_id) => {
            let treasury = lock_treasury(conn, treasury_id).await?;
            let amount = TreasuryService::payout_amount(
                &treasury,
                &currency,
                &settings.base_currency,
                settlement.amount,
                base_amount,
            )?;
            Some((treasury_id, amount))
        }
        None => None,
    };

    let now = Utc::now().into();
    let installment = installments::ActiveModel {
        id: Set(InstallmentId::new().into_inner()),
        obligation_id: Set(obligation.id),
        amount: Set(settlement.amount),
        exchange_rate: Set(settlement.exchange_rate),
        base_amount: Set(base_amount),
        treasury_id: Set(settlement.treasury_id.map(TreasuryId::into_inner)),
        payment_method: Set(settlement.payment_method),
        reference_number: Set(settlement.reference_number),
        created_by: Set(created_by.map(UserId::into_inner)),
        paid_at: Set(now),
    }
    .insert(conn)
    .await?;
    let reference = Reference::new(ReferenceKind::Payment, installment.id);

    let party_entry = match obligation.party_id {
        Some(party_id) => {
            let account = party_account(conn, PartyId::from_uuid(party_id)).await?;
            Some(
                append_entry(
                    conn,
                    NewLedgerEntry {
                        account,
                        direction: Direction::Debit,
                        amount: settlement.amount,
                        currency: currency.clone(),
                        reference,
                        description: format!("Installment on obligation {}", obligation.id),
                        created_by,
                    },
                )
                .await?,
            )
        }
        None => None,
    };

    let treasury_entry = match payout {
        Some((treasury_id, amount)) => Some(
            withdraw_in(
                conn,
                treasury_id,
                TreasuryMovement {
                    amount,
                    reference,
                    description: format!("Payment on obligation {}", obligation.id),
                },
                created_by,
            )
            .await?,
        ),
        None => None,
    };

    let mut model: payment_obligations::ActiveModel = obligation.into();
    model.status = Set(settlement.status.into());
    if settlement.status == ObligationStatus::Paid {
        model.paid_at = Set(Some(now));
    }
    model.updated_at = Set(now);
    let obligation = model.update(conn).await?;

    Ok(InstallmentReceipt {
        installment,
        obligation,
        remaining: settlement.remaining,
        party_entry,
        treasury_entry,
    })
}

/// Credits back the treasury withdrawal of an installment of an obligation
/// in `currency`.
async fn compensate_withdrawal<C: ConnectionTrait>(
    conn: &C,
    base_currency: &CurrencyCode,
    currency: &CurrencyCode,
    installment: &installments::Model,
    created_by: Option<UserId>,
) -> Result<Option<LedgerEntry>, FinanceError> {
    let Some(treasury_id) = installment.treasury_id.map(TreasuryId::from_uuid) else {
        return Ok(None);
    };
    let treasury = lock_treasury(conn, treasury_id).await?;
    let amount = TreasuryService::payout_amount(
        &treasury,
        currency,
        base_currency,
        installment.amount,
        installment.base_amount,
    )?;

    let entry = append_entry(
        conn,
        NewLedgerEntry {
            account: AccountRef::treasury(treasury_id),
            direction: Direction::Credit,
            amount,
            currency: treasury.currency,
            reference: Reference::new(ReferenceKind::Adjustment, installment.id),
            description: format!("Reversal of installment {}", installment.id),
            created_by,
        },
    )
    .await?;

    info!(
        %treasury_id,
        installment_id = %installment.id,
        amount = %entry.amount,
        "Treasury withdrawal compensated"
    );
    Ok(Some(entry))
}

async fn find_obligation<C: ConnectionTrait>(
    conn: &C,
    id: ObligationId,
) -> Result<payment_obligations::Model, FinanceError> {
    Ok(payment_obligations::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Obligation", id))?)
}

async fn lock_obligation<C: ConnectionTrait>(
    conn: &C,
    id: ObligationId,
) -> Result<payment_obligations::Model, FinanceError> {
    Ok(
        for_update(payment_obligations::Entity::find_by_id(id.into_inner()), conn)
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::not_found("Obligation", id))?,
    )
}

async fn installments_of<C: ConnectionTrait>(
    conn: &C,
    id: ObligationId,
) -> Result<Vec<installments::Model>, FinanceError> {
    Ok(installments::Entity::find()
        .filter(installments::Column::ObligationId.eq(id.into_inner()))
        .order_by_asc(installments::Column::PaidAt)
        .all(conn)
        .await?)
}

fn sum_paid(installments: &[installments::Model]) -> Decimal {
    installments.iter().map(|installment| installment.amount).sum()
}

async fn state_of<C: ConnectionTrait>(
    conn: &C,
    obligation: &payment_obligations::Model,
) -> Result<ObligationState, FinanceError> {
    let id = ObligationId::from_uuid(obligation.id);
    let paid = sum_paid(&installments_of(conn, id).await?);
    Ok(ObligationState {
        id,
        status: obligation.status.into(),
        total_amount: obligation.total_amount,
        paid,
    })
}
