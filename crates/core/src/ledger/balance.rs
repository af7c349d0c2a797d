//! Running balance calculations.
//!
//! For a fixed `(account, currency)` the entries ordered by version form a
//! chain: each entry's `balance_before` is the previous entry's
//! `balance_after`, and the first entry starts from zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::LedgerError;
use super::types::Direction;

/// Running balance information for a ledger entry.
///
/// - version: position in the chain, monotonically increasing from 1
/// - balance_before: balance before this entry
/// - balance_after: balance after this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Chain position.
    pub version: i64,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
}

impl RunningBalance {
    /// Creates the running balance for the first entry on an account.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the amount leaves the decimal range.
    pub fn first_entry(direction: Direction, amount: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            version: 1,
            balance_before: Decimal::ZERO,
            balance_after: direction.apply(Decimal::ZERO, amount)?,
        })
    }

    /// Creates the running balance following `previous`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the new balance leaves the decimal range.
    pub fn next_entry(
        previous: &Self,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            version: previous.version + 1,
            balance_before: previous.balance_after,
            balance_after: direction.apply(previous.balance_after, amount)?,
        })
    }

    /// Creates the running balance after the latest stored entry, if any.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the new balance leaves the decimal range.
    pub fn after(
        latest: Option<&Self>,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Self, LedgerError> {
        match latest {
            Some(previous) => Self::next_entry(previous, direction, amount),
            None => Self::first_entry(direction, amount),
        }
    }
}

/// The fields of a stored entry needed to replay its chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink {
    /// Entry id.
    pub entry_id: Uuid,
    /// Chain position.
    pub version: i64,
    /// CREDIT or DEBIT.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Stored balance before.
    pub balance_before: Decimal,
    /// Stored balance after.
    pub balance_after: Decimal,
}

/// One stored entry that disagrees with the replayed chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBreak {
    /// Entry id.
    pub entry_id: Uuid,
    /// Chain position.
    pub version: i64,
    /// Replayed balance before.
    pub expected_before: Decimal,
    /// Stored balance before.
    pub stored_before: Decimal,
    /// Replayed balance after.
    pub expected_after: Decimal,
    /// Stored balance after.
    pub stored_after: Decimal,
}

/// Result of replaying an `(account, currency)` chain from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    /// Number of entries replayed.
    pub entries_checked: usize,
    /// Entries whose stored balances disagree with the replay.
    pub breaks: Vec<ChainBreak>,
    /// Balance obtained by replaying every entry from zero.
    pub replayed_balance: Decimal,
    /// Stored `balance_after` of the last entry (zero if none).
    pub last_stored_balance: Decimal,
}

impl ChainReport {
    /// True when every stored balance matches the replay.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.breaks.is_empty() && self.replayed_balance == self.last_stored_balance
    }
}

/// Replays `links` (ordered by version) from zero and reports mismatches.
///
/// # Errors
///
/// Returns a validation error if the replayed balance leaves the decimal
/// range.
pub fn verify_chain(links: &[ChainLink]) -> Result<ChainReport, LedgerError> {
    let mut running = Decimal::ZERO;
    let mut breaks = Vec::new();

    for link in links {
        let expected_after = link.direction.apply(running, link.amount)?;
        if link.balance_before != running || link.balance_after != expected_after {
            breaks.push(ChainBreak {
                entry_id: link.entry_id,
                version: link.version,
                expected_before: running,
                stored_before: link.balance_before,
                expected_after,
                stored_after: link.balance_after,
            });
        }
        running = expected_after;
    }

    Ok(ChainReport {
        entries_checked: links.len(),
        breaks,
        replayed_balance: running,
        last_stored_balance: links.last().map_or(Decimal::ZERO, |l| l.balance_after),
    })
}
