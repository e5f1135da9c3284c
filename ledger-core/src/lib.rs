//! Tabsplit Ledger Core
//!
//! Shared-expense bookkeeping for a small group of members.
//!
//! # Architecture
//!
//! - **Types**: members, expenses and cent-precision money helpers
//! - **Balance Calculator**: derives every member's net position from the
//!   full expense list, recomputed from scratch on every call
//! - **Group**: owns one group's members, expenses and expense-id counter and
//!   enforces the calculator's preconditions
//! - **Store**: JSON key-value persistence of named groups
//!
//! # Invariants
//!
//! - Money conservation: Σ(credits) == Σ(debits) for every expense, so the
//!   balances of a group sum to zero within rounding
//! - Deterministic: same members and expenses → same balances
//! - Expense IDs are monotonic and never reused within a group

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod balance;
pub mod group;
pub mod store;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    is_settled, round_cents, Balances, Expense, ExpenseId, Member, NewExpense, CENT_TOLERANCE,
    MAX_EXPENSE_AMOUNT,
};
pub use balance::compute_balances;
pub use group::Group;
pub use store::{GroupListing, GroupStore};
pub use config::Config;
