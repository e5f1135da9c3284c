//! Settlement optimizer
//!
//! Turns net balances into a short ordered list of pairwise payments.
//!
//! # Algorithm
//!
//! 1. Split members into creditors (balance > 0.01) and debtors
//!    (balance < -0.01, kept as a positive amount owed); the rest are settled
//! 2. Sort both lists by amount, largest first (stable, so equal amounts keep
//!    member order)
//! 3. Repeatedly pay the head creditor from the head debtor the smaller of
//!    their two remaining amounts, dropping whoever falls below one cent
//!
//! The lists are never re-sorted: a payment always exhausts at least one head,
//! so each list stays in descending order. This greedy largest-to-largest
//! matching needs at most `|creditors| + |debtors| - 1` payments.
//!
//! # Example
//!
//! ```text
//! Balances:
//!   A: +$60
//!   B: -$30
//!   C: -$30
//!
//! Settlements:
//!   B pays A $30
//!   C pays A $30
//! ```

use crate::{
    types::{Position, Settlement, Side},
    Error, Result,
};
use ledger_core::{round_cents, Balances, Expense, Member, CENT_TOLERANCE};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

/// Compute the settlement list for a set of balances
///
/// Pure and deterministic: identical balances (including member order) give
/// identical settlements.
pub fn compute_settlements(balances: &Balances) -> Vec<Settlement> {
    let (mut creditors, mut debtors) = split_positions(balances);

    // Largest first
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut creditors = VecDeque::from(creditors);
    let mut debtors = VecDeque::from(debtors);
    let mut settlements = Vec::new();

    loop {
        let (creditor, debtor) = match (creditors.front_mut(), debtors.front_mut()) {
            (Some(creditor), Some(debtor)) => (creditor, debtor),
            _ => break,
        };

        let amount = creditor.remaining.min(debtor.remaining);
        let rounded = round_cents(amount);

        if rounded > Decimal::ZERO {
            settlements.push(Settlement {
                from: debtor.member.clone(),
                to: creditor.member.clone(),
                amount: rounded,
            });
        }

        creditor.take(amount);
        debtor.take(amount);

        let creditor_done = creditor.is_exhausted();
        let debtor_done = debtor.is_exhausted();
        if creditor_done {
            creditors.pop_front();
        }
        if debtor_done {
            debtors.pop_front();
        }
    }

    settlements
}

/// Apply settlements to balances as completed payments
///
/// The payer's balance rises and the recipient's falls by the amount, so a
/// correct settlement list leaves every balance within one cent of zero.
pub fn apply_settlements(balances: &Balances, settlements: &[Settlement]) -> Balances {
    let mut after = balances.clone();
    for settlement in settlements {
        after.adjust(&settlement.from, settlement.amount);
        after.adjust(&settlement.to, -settlement.amount);
    }
    after
}

/// Number of distinct member pairs that owe each other directly
///
/// Counts the payments needed if every participant repaid every payer
/// without netting; opposite debts between the same two members cancel.
pub fn pairwise_debt_count(expenses: &[Expense]) -> usize {
    let mut pairs: BTreeMap<(&Member, &Member), Decimal> = BTreeMap::new();

    for expense in expenses {
        let share = match expense.share() {
            Some(share) => share,
            None => continue,
        };

        for participant in &expense.participants {
            if participant == &expense.payer {
                continue;
            }

            // Store each pair in one direction so opposite debts meet
            let (key, signed) = if participant < &expense.payer {
                ((participant, &expense.payer), share)
            } else {
                ((&expense.payer, participant), -share)
            };
            *pairs.entry(key).or_insert(Decimal::ZERO) += signed;
        }
    }

    pairs.values().filter(|net| net.abs() > CENT_TOLERANCE).count()
}

fn split_positions(balances: &Balances) -> (Vec<Position>, Vec<Position>) {
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();

    for (member, balance) in balances.iter() {
        match Side::of(balance) {
            Side::Creditor => creditors.push(Position::new(member.clone(), balance)),
            Side::Debtor => debtors.push(Position::new(member.clone(), -balance)),
            Side::Settled => {}
        }
    }

    (creditors, debtors)
}

/// Settlement optimizer with optional self-check
#[derive(Debug, Clone)]
pub struct NettingEngine {
    /// Re-apply settlements and check the residuals
    verify: bool,
}

impl NettingEngine {
    /// Create new netting engine
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    /// Compute settlements, checking the result when verification is on
    pub fn compute_settlements(&self, balances: &Balances) -> Result<Vec<Settlement>> {
        let settlements = compute_settlements(balances);

        tracing::debug!(
            members = balances.len(),
            settlements = settlements.len(),
            "Computed settlements"
        );

        if self.verify {
            self.verify_settlements(balances, &settlements)?;
        }

        Ok(settlements)
    }

    /// Check that settlements clear the balances
    ///
    /// Every payment must be positive and between two different members, and
    /// after applying them no member may be left with more than the
    /// imbalance the input already carried plus a cent per member.
    pub fn verify_settlements(&self, balances: &Balances, settlements: &[Settlement]) -> Result<()> {
        for settlement in settlements {
            if settlement.from == settlement.to {
                return Err(Error::Netting(format!(
                    "{} would pay themselves",
                    settlement.from
                )));
            }
            if settlement.amount <= Decimal::ZERO {
                return Err(Error::Netting(format!(
                    "non-positive payment {}",
                    settlement
                )));
            }
        }

        let after = apply_settlements(balances, settlements);
        let allowed = balances.total().abs() + CENT_TOLERANCE * Decimal::from(balances.len());

        for (member, residual) in after.iter() {
            if residual.abs() > allowed {
                tracing::warn!(member = %member, residual = %residual, "Settlement left residual");
                return Err(Error::Netting(format!(
                    "{} left with residual {} after settlement",
                    member, residual
                )));
            }
        }

        Ok(())
    }
}

impl Default for NettingEngine {
    fn default() -> Self {
        Self::new(true)
    }
}
