//! Conversions between `mizan-core` types and stored rows.

use mizan_core::document::DocumentStatus;
use mizan_core::ledger::{AccountRef, Direction, LedgerEntry, PartyKind, Reference, ReferenceKind};
use mizan_core::obligation::ObligationStatus;
use mizan_core::treasury::TreasuryKind;
use mizan_core::LedgerError;
use mizan_shared::types::{CurrencyCode, LedgerEntryId, UserId};

use crate::entities::{ledger_entries, sea_orm_active_enums as db};

impl From<Direction> for db::EntryDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Credit => Self::Credit,
            Direction::Debit => Self::Debit,
        }
    }
}

impl From<db::EntryDirection> for Direction {
    fn from(value: db::EntryDirection) -> Self {
        match value {
            db::EntryDirection::Credit => Self::Credit,
            db::EntryDirection::Debit => Self::Debit,
        }
    }
}

impl From<ReferenceKind> for db::ReferenceKind {
    fn from(value: ReferenceKind) -> Self {
        match value {
            ReferenceKind::Purchase => Self::Purchase,
            ReferenceKind::Payment => Self::Payment,
            ReferenceKind::Return => Self::Return,
            ReferenceKind::Adjustment => Self::Adjustment,
            ReferenceKind::Salary => Self::Salary,
            ReferenceKind::Bonus => Self::Bonus,
            ReferenceKind::Sale => Self::Sale,
            ReferenceKind::Transfer => Self::Transfer,
            ReferenceKind::Deposit => Self::Deposit,
        }
    }
}

impl From<db::ReferenceKind> for ReferenceKind {
    fn from(value: db::ReferenceKind) -> Self {
        match value {
            db::ReferenceKind::Purchase => Self::Purchase,
            db::ReferenceKind::Payment => Self::Payment,
            db::ReferenceKind::Return => Self::Return,
            db::ReferenceKind::Adjustment => Self::Adjustment,
            db::ReferenceKind::Salary => Self::Salary,
            db::ReferenceKind::Bonus => Self::Bonus,
            db::ReferenceKind::Sale => Self::Sale,
            db::ReferenceKind::Transfer => Self::Transfer,
            db::ReferenceKind::Deposit => Self::Deposit,
        }
    }
}

impl From<PartyKind> for db::PartyKind {
    fn from(value: PartyKind) -> Self {
        match value {
            PartyKind::Supplier => Self::Supplier,
            PartyKind::Customer => Self::Customer,
            PartyKind::Employee => Self::Employee,
        }
    }
}

impl From<db::PartyKind> for PartyKind {
    fn from(value: db::PartyKind) -> Self {
        match value {
            db::PartyKind::Supplier => Self::Supplier,
            db::PartyKind::Customer => Self::Customer,
            db::PartyKind::Employee => Self::Employee,
        }
    }
}

impl From<TreasuryKind> for db::TreasuryKind {
    fn from(value: TreasuryKind) -> Self {
        match value {
            TreasuryKind::Company => Self::Company,
            TreasuryKind::General => Self::General,
            TreasuryKind::Bank => Self::Bank,
        }
    }
}

impl From<ObligationStatus> for db::ObligationStatus {
    fn from(value: ObligationStatus) -> Self {
        match value {
            ObligationStatus::Pending => Self::Pending,
            ObligationStatus::Paid => Self::Paid,
            ObligationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<db::ObligationStatus> for ObligationStatus {
    fn from(value: db::ObligationStatus) -> Self {
        match value {
            db::ObligationStatus::Pending => Self::Pending,
            db::ObligationStatus::Paid => Self::Paid,
            db::ObligationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<DocumentStatus> for db::DocumentStatus {
    fn from(value: DocumentStatus) -> Self {
        match value {
            DocumentStatus::Draft => Self::Draft,
            DocumentStatus::Approved => Self::Approved,
            DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<db::DocumentStatus> for DocumentStatus {
    fn from(value: db::DocumentStatus) -> Self {
        match value {
            db::DocumentStatus::Draft => Self::Draft,
            db::DocumentStatus::Approved => Self::Approved,
            db::DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Parses a currency code read back from the database.
pub(crate) fn stored_currency(code: &str) -> Result<CurrencyCode, LedgerError> {
    CurrencyCode::parse(code).map_err(LedgerError::Internal)
}

/// Rebuilds a core entry from its row.
pub(crate) fn entry_from_model(model: ledger_entries::Model) -> Result<LedgerEntry, LedgerError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        account: AccountRef::from_parts(&model.account_kind, model.account_id)?,
        direction: model.direction.into(),
        amount: model.amount,
        currency: stored_currency(&model.currency)?,
        balance_before: model.balance_before,
        balance_after: model.balance_after,
        version: model.version,
        reference: Reference::new(model.reference_kind.into(), model.reference_id),
        description: model.description,
        created_by: model.created_by.map(UserId::from_uuid),
        created_at: model.created_at.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row(account_kind: &str) -> ledger_entries::Model {
        ledger_entries::Model {
            id: Uuid::now_v7(),
            account_kind: account_kind.to_string(),
            account_id: Uuid::now_v7(),
            direction: db::EntryDirection::Debit,
            amount: dec!(250),
            currency: "LYD".to_string(),
            balance_before: dec!(1000),
            balance_after: dec!(750),
            version: 4,
            reference_kind: db::ReferenceKind::Payment,
            reference_id: Uuid::now_v7(),
            description: "Installment".to_string(),
            created_by: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_entry_from_party_row() {
        let model = row("supplier");
        let account_id = model.account_id;
        let reference_id = model.reference_id;

        let entry = entry_from_model(model).unwrap();

        assert_eq!(
            entry.account,
            AccountRef::party(PartyKind::Supplier, account_id.into())
        );
        assert_eq!(entry.direction, Direction::Debit);
        assert_eq!(entry.balance_after, dec!(750));
        assert_eq!(entry.version, 4);
        assert_eq!(
            entry.reference,
            Reference::new(ReferenceKind::Payment, reference_id)
        );
        assert!(entry.created_by.is_none());
    }

    #[test]
    fn test_entry_from_row_with_unknown_account_kind() {
        assert!(entry_from_model(row("vault")).is_err());
    }

    #[rstest]
    #[case("LYD", true)]
    #[case("usd", true)]
    #[case("", false)]
    #[case("DINAR", false)]
    fn test_stored_currency(#[case] stored: &str, #[case] valid: bool) {
        let parsed = stored_currency(stored);
        assert_eq!(parsed.is_ok(), valid);
        if let Err(err) = parsed {
            assert!(matches!(err, LedgerError::Internal(_)));
        }
    }
}
