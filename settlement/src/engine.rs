//! Main settlement engine
//!
//! Orchestrates balance calculation, netting and the conservation checks
//! around them.

use crate::{
    config::Config,
    netting::{pairwise_debt_count, NettingEngine},
    types::*,
    Error, Result,
};
use ledger_core::{
    compute_balances, group::MIN_MEMBERS_FOR_SETTLEMENT, is_settled, Expense, Group, Member,
    CENT_TOLERANCE,
};
use rust_decimal::Decimal;

/// Settlement engine
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    /// Netting engine
    netting: NettingEngine,

    /// Configuration
    config: Config,
}

impl SettlementEngine {
    /// Create new settlement engine
    pub fn new(config: Config) -> Self {
        let netting = NettingEngine::new(config.netting.verify_settlements);
        Self { netting, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settle a stored or in-memory group
    ///
    /// Requires at least two members and one expense.
    pub fn settle_group(&self, group: &Group) -> Result<SettlementReport> {
        if !group.is_ready() {
            return Err(Error::NotReady(format!(
                "group {} has {} member(s) and {} expense(s); need at least 2 members and 1 expense",
                group.name,
                group.members().len(),
                group.expenses().len()
            )));
        }

        self.report_group(group)
    }

    /// Report on a group whether or not it is ready
    ///
    /// A group that is not ready yields its (zero) balances, no settlements and
    /// `ready == false`.
    pub fn report_group(&self, group: &Group) -> Result<SettlementReport> {
        let mut report = self.settle(group.members(), group.expenses())?;
        report.group = Some(group.name.clone());
        Ok(report)
    }

    /// Settle an explicit snapshot of members and expenses
    pub fn settle(&self, members: &[Member], expenses: &[Expense]) -> Result<SettlementReport> {
        tracing::debug!(
            members = members.len(),
            expenses = expenses.len(),
            "Starting settlement"
        );

        // Step 1: Net balances
        let balances = compute_balances(members, expenses)?;

        // Step 2: Conservation check
        let total = balances.total();
        let tolerance = CENT_TOLERANCE * Decimal::from(members.len().max(1));
        if total.abs() > tolerance {
            return Err(ledger_core::Error::InvariantViolation(format!(
                "balances sum to {} (tolerance {})",
                total, tolerance
            ))
            .into());
        }

        // Step 3: Netting
        let settlements = self.netting.compute_settlements(&balances)?;

        let stats = SettlementStats {
            member_count: members.len(),
            expense_count: expenses.len(),
            total_spent: expenses.iter().map(|e| e.amount).sum(),
            unsettled_count: balances.iter().filter(|(_, b)| !is_settled(*b)).count(),
            settlement_count: settlements.len(),
            total_transferred: settlements.iter().map(|s| s.amount).sum(),
            gross_debt_count: pairwise_debt_count(expenses),
        };

        tracing::info!(
            settlements = stats.settlement_count,
            total_transferred = %stats.total_transferred,
            transfers_eliminated = stats.transfers_eliminated(),
            "Settlement computed"
        );

        Ok(SettlementReport {
            group: None,
            ready: members.len() >= MIN_MEMBERS_FOR_SETTLEMENT && !expenses.is_empty(),
            balances,
            settlements,
            stats,
        })
    }
}
