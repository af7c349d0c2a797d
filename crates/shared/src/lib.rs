//! Shared types, errors, and configuration for Mizan.
//!
//! This crate provides common types used across all other crates:
//! - Money amounts and validated currency codes
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ExpenseLedgerMode, LedgerConfig, ReversalPolicy};
pub use error::{AppError, AppResult};
