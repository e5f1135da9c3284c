//! Core types for settlement

use ledger_core::{is_settled, Balances, Member, CENT_TOLERANCE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directed payment instruction: `from` pays `to` the amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Debtor (pays)
    pub from: Member,

    /// Creditor (receives)
    pub to: Member,

    /// Amount to transfer (positive, cent precision)
    pub amount: Decimal,
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} {:.2}", self.from, self.to, self.amount)
    }
}

/// Which side of the settlement a member is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Is owed money (balance above the cent tolerance)
    Creditor,
    /// Owes money (balance below minus the cent tolerance)
    Debtor,
    /// Within one cent of zero
    Settled,
}

impl Side {
    /// Classify a balance
    pub fn of(balance: Decimal) -> Self {
        if balance > CENT_TOLERANCE {
            Side::Creditor
        } else if balance < -CENT_TOLERANCE {
            Side::Debtor
        } else {
            Side::Settled
        }
    }
}

/// A creditor or debtor with the amount still to be settled
#[derive(Debug, Clone)]
pub struct Position {
    /// Member
    pub member: Member,

    /// Amount still owed to / by the member, always positive
    pub remaining: Decimal,
}

impl Position {
    /// Create new position from a balance magnitude
    pub fn new(member: Member, remaining: Decimal) -> Self {
        Self { member, remaining }
    }

    /// Reduce the remaining amount
    pub fn take(&mut self, amount: Decimal) {
        self.remaining -= amount;
    }

    /// Remaining amount has dropped below one cent
    pub fn is_exhausted(&self) -> bool {
        self.remaining < CENT_TOLERANCE
    }
}

/// Result of settling one set of members and expenses
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    /// Group name, when settling a stored group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// At least two members and one expense, so settlements are meaningful
    pub ready: bool,

    /// Net balance per member, in member order
    pub balances: Balances,

    /// Ordered payment instructions
    pub settlements: Vec<Settlement>,

    /// Summary figures
    pub stats: SettlementStats,
}

impl SettlementReport {
    /// Nobody needs to pay anybody
    pub fn is_all_settled(&self) -> bool {
        self.settlements.is_empty()
    }

    /// Number of payments needed
    pub fn transaction_count(&self) -> usize {
        self.settlements.len()
    }

    /// Members that are neither owed nor owing
    pub fn settled_members(&self) -> impl Iterator<Item = &Member> + '_ {
        self.balances
            .iter()
            .filter(|(_, balance)| is_settled(*balance))
            .map(|(member, _)| member)
    }
}

/// Settlement statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementStats {
    /// Number of members
    pub member_count: usize,

    /// Number of expenses
    pub expense_count: usize,

    /// Sum of all expense amounts
    pub total_spent: Decimal,

    /// Number of members with a non-zero balance
    pub unsettled_count: usize,

    /// Number of payments needed
    pub settlement_count: usize,

    /// Sum of all settlement amounts
    pub total_transferred: Decimal,

    /// Number of distinct payer → participant debts before netting
    pub gross_debt_count: usize,
}

impl SettlementStats {
    /// Payments saved compared with settling every pairwise debt directly
    pub fn transfers_eliminated(&self) -> usize {
        self.gross_debt_count.saturating_sub(self.settlement_count)
    }
}
