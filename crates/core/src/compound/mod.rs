//! Compound transactions.
//!
//! The planners here decide everything that can be decided before a write:
//! relationships, totals, and which expenses create debt. The database layer
//! then applies a plan inside one unit of work.

pub mod expenses;
pub mod intercompany;

pub use expenses::{plan_expenses, ExpenseInput, ExpensePlan, PlannedExpense, PurchaseTotals};
pub use intercompany::{
    plan_inter_company_sale, CompanyLink, InterCompanySaleLine, InterCompanySalePlan,
};
