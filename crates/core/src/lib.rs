//! Mizan Core - settlement rules for the trading ledger.
//!
//! This crate contains pure business logic with ZERO database or web
//! dependencies:
//! - Currency conversion to the base currency
//! - Ledger entries, running balances, and statements
//! - Treasury movement rules
//! - Party sub-ledger summaries
//! - Obligation and installment state machine
//! - Sale/purchase document lifecycle
//! - Compound transaction planning

pub mod compound;
pub mod currency;
pub mod document;
pub mod ledger;
pub mod obligation;
pub mod party;
pub mod treasury;

pub use ledger::LedgerError;
