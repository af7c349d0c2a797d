//! Treasury cash and bank accounts.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::TreasuryService;
pub use types::{NewTreasury, TreasuryInfo, TreasuryKind};
