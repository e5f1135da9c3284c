//! Settlement Engine
//!
//! Computes who owes whom in a group of members sharing expenses.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! 1. **Balances**: net position per member from the expense list
//!    ([`ledger_core::compute_balances`])
//! 2. **Netting**: greedy largest-to-largest matching of creditors and debtors
//!    ([`compute_settlements`])
//! 3. **Report**: balances, ordered payments and summary figures
//!    ([`SettlementEngine`])
//!
//! Both computations are pure functions of their input snapshot; the engine
//! adds readiness checks, conservation checks and logging around them.
//!
//! # Example
//!
//! ```
//! use ledger_core::{Group, NewExpense};
//! use rust_decimal::Decimal;
//! use settlement::{Config, SettlementEngine};
//!
//! fn main() -> settlement::Result<()> {
//!     let mut group = Group::new("Weekend")?;
//!     group.add_member("A")?;
//!     group.add_member("B")?;
//!     group.add_expense(NewExpense {
//!         description: "Dinner".to_string(),
//!         amount: Decimal::from(100),
//!         payer: "A".to_string(),
//!         participants: vec!["A".to_string(), "B".to_string()],
//!     })?;
//!
//!     let engine = SettlementEngine::new(Config::default());
//!     let report = engine.settle_group(&group)?;
//!     assert_eq!(report.settlements[0].to_string(), "B pays A 50.00");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod netting;
pub mod error;
pub mod config;
pub mod engine;

// Re-exports
pub use error::{Error, Result};
pub use types::*;
pub use netting::{apply_settlements, compute_settlements, NettingEngine};
pub use config::Config;
pub use engine::SettlementEngine;
