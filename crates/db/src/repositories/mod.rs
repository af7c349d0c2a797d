//! Repositories over the settlement tables.
//!
//! Each public operation runs in one database transaction. Cross-repository
//! steps share `pub(crate)` helpers that take an open connection instead of
//! nesting transactions.

pub mod company;
pub mod compound;
pub mod document;
pub mod ledger;
pub mod obligation;
pub mod party;
pub mod treasury;

pub use company::CompanyRepository;
pub use compound::{
    CompoundRepository, ExpenseAllocation, InterCompanySaleInput, InterCompanySaleResult,
    LedgerFailure,
};
pub use document::{DocumentRepository, NewPurchase, NewSale, PurchaseView, SaleView};
pub use ledger::{ChainVerification, LedgerRepository};
pub use obligation::{
    InstallmentReceipt, ObligationFilter, ObligationRepository, ObligationView, PayInFull,
};
pub use party::{PartyPosting, PartyRepository};
pub use treasury::{
    TransferInput, TransferResult, TreasuryFilter, TreasuryMovement, TreasuryRepository,
};
