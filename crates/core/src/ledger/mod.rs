//! Ledger primitives.
//!
//! This module holds the pure parts of the ledger:
//! - Entry, account, and reference types
//! - Running balance chain and its verification
//! - Statements with per-currency totals
//! - The error taxonomy shared by every settlement operation

pub mod balance;
pub mod error;
pub mod statement;
pub mod types;

pub use balance::{verify_chain, ChainBreak, ChainLink, ChainReport, RunningBalance};
pub use error::LedgerError;
pub use statement::{totals_by_currency, CurrencyTotals, Statement};
pub use types::{
    AccountRef, Direction, LedgerEntry, NewLedgerEntry, PartyKind, Reference, ReferenceKind,
};
