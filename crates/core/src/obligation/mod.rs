//! Payment obligations and installments.
//!
//! States: `PENDING -> PAID` and `PENDING -> CANCELLED`. Deleting an
//! installment may move a `PAID` obligation back to `PENDING`.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{ObligationService, SETTLEMENT_EPSILON};
pub use types::{
    InstallmentPlan, NewInstallment, NewObligation, ObligationState, ObligationStatus, RateRebind,
};
