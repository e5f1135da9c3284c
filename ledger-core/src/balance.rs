//! Balance calculator
//!
//! Derives each member's net position from the full expense list.
//!
//! # Algorithm
//!
//! 1. Start every member at zero
//! 2. For each expense, credit the payer with the full amount and debit every
//!    participant with `amount / |participants|`
//! 3. Round every balance to cents (ties away from zero)
//!
//! # Example
//!
//! ```text
//! Expense: A pays $90 for A, B, C
//!
//! Balances:
//!   A: +$60  (paid 90, owes 30)
//!   B: -$30
//!   C: -$30
//! ```
//!
//! Every expense credits exactly `amount` and debits exactly `amount`, so the
//! balances always sum to zero up to the per-member cent rounding.

use crate::{
    types::{Balances, Expense, Member},
    Error, Result,
};
use rust_decimal::Decimal;

/// Compute net balances for `members` from `expenses`
///
/// Pure and stateless: the result depends only on the arguments and is
/// recomputed from scratch on every call. Balances are returned in member
/// order.
///
/// The payer and participants of every expense must be in `members`, member
/// names must be unique (case-insensitive), and every expense must have a
/// positive amount and at least one participant. Violations are reported as
/// errors rather than producing a non-conserving result.
pub fn compute_balances(members: &[Member], expenses: &[Expense]) -> Result<Balances> {
    check_members(members)?;

    let mut balances = Balances::with_members(members);

    for expense in expenses {
        expense.validate()?;

        let share = expense.share().ok_or_else(|| {
            Error::InvalidExpense(format!("expense {} has no participants", expense.id))
        })?;

        credit(&mut balances, &expense.payer, expense.amount, expense.id)?;
        for participant in &expense.participants {
            credit(&mut balances, participant, -share, expense.id)?;
        }
    }

    balances.round_all();

    tracing::debug!(
        members = members.len(),
        expenses = expenses.len(),
        total = %balances.total(),
        "Computed balances"
    );

    Ok(balances)
}

/// Reject member lists with case-insensitive duplicates
fn check_members(members: &[Member]) -> Result<()> {
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.same_name(member.as_str())) {
            return Err(Error::DuplicateMember(member.to_string()));
        }
    }
    Ok(())
}

fn credit(balances: &mut Balances, member: &Member, amount: Decimal, expense_id: u64) -> Result<()> {
    balances.try_adjust(member, amount).map_err(|err| match err {
        Error::UnknownMember(name) => {
            Error::UnknownMember(format!("{} (referenced by expense {})", name, expense_id))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CENT_TOLERANCE, MAX_EXPENSE_AMOUNT};
    use rust_decimal_macros::dec;

    fn members(names: &[&str]) -> Vec<Member> {
        names.iter().map(|n| Member::new(*n)).collect()
    }

    fn expense(id: u64, amount: Decimal, payer: &str, participants: &[&str]) -> Expense {
        Expense {
            id,
            description: format!("expense {}", id),
            amount,
            payer: Member::new(payer),
            participants: members(participants),
        }
    }

    fn balance(balances: &Balances, name: &str) -> Decimal {
        balances.get(&Member::new(name)).unwrap()
    }

    #[test]
    fn test_two_members_even_split() {
        let members = members(&["A", "B"]);
        let expenses = vec![expense(1, dec!(100), "A", &["A", "B"])];

        let balances = compute_balances(&members, &expenses).unwrap();

        assert_eq!(balance(&balances, "A"), dec!(50));
        assert_eq!(balance(&balances, "B"), dec!(-50));
    }

    #[test]
    fn test_three_way_split() {
        let members = members(&["A", "B", "C"]);
        let expenses = vec![expense(1, dec!(90), "A", &["A", "B", "C"])];

        let balances = compute_balances(&members, &expenses).unwrap();

        assert_eq!(balance(&balances, "A"), dec!(60));
        assert_eq!(balance(&balances, "B"), dec!(-30));
        assert_eq!(balance(&balances, "C"), dec!(-30));
    }

    #[test]
    fn test_uneven_split_rounds_to_cents() {
        // 100 / 3 = 33.333...
        let members = members(&["A", "B", "C"]);
        let expenses = vec![expense(1, dec!(100), "A", &["A", "B", "C"])];

        let balances = compute_balances(&members, &expenses).unwrap();

        assert_eq!(balance(&balances, "A"), dec!(66.67));
        assert_eq!(balance(&balances, "B"), dec!(-33.33));
        assert_eq!(balance(&balances, "C"), dec!(-33.33));
        assert!(balances.total().abs() <= CENT_TOLERANCE);
    }

    #[test]
    fn test_offsetting_expenses_cancel() {
        let members = members(&["A", "B"]);
        let expenses = vec![
            expense(1, dec!(20), "A", &["A", "B"]),
            expense(2, dec!(20), "B", &["A", "B"]),
        ];

        let balances = compute_balances(&members, &expenses).unwrap();

        assert!(balances.iter().all(|(_, b)| b.is_zero()));
    }

    #[test]
    fn test_payer_not_participating() {
        let members = members(&["A", "B", "C"]);
        let expenses = vec![expense(1, dec!(30), "C", &["A", "B"])];

        let balances = compute_balances(&members, &expenses).unwrap();

        assert_eq!(balance(&balances, "A"), dec!(-15));
        assert_eq!(balance(&balances, "B"), dec!(-15));
        assert_eq!(balance(&balances, "C"), dec!(30));
    }

    #[test]
    fn test_members_without_expenses_are_zero() {
        let members = members(&["A", "B", "C"]);

        let balances = compute_balances(&members, &[]).unwrap();

        assert_eq!(balances.len(), 3);
        assert!(balances.iter().all(|(_, b)| b.is_zero()));
    }

    #[test]
    fn test_balances_follow_member_order() {
        let members = members(&["Charlie", "alice", "Bob"]);
        let expenses = vec![expense(1, dec!(30), "Bob", &["Charlie", "alice", "Bob"])];

        let balances = compute_balances(&members, &expenses).unwrap();

        let order: Vec<&str> = balances.members().map(Member::as_str).collect();
        assert_eq!(order, vec!["Charlie", "alice", "Bob"]);
    }

    #[test]
    fn test_unknown_payer_rejected() {
        let members = members(&["A", "B"]);
        let expenses = vec![expense(7, dec!(10), "Z", &["A", "B"])];

        let err = compute_balances(&members, &expenses).unwrap_err();
        assert!(matches!(err, Error::UnknownMember(ref msg) if msg.contains("expense 7")));
    }

    #[test]
    fn test_unknown_participant_rejected() {
        let members = members(&["A", "B"]);
        let expenses = vec![expense(1, dec!(10), "A", &["A", "Z"])];

        assert!(matches!(
            compute_balances(&members, &expenses),
            Err(Error::UnknownMember(_))
        ));
    }

    #[test]
    fn test_invalid_expenses_rejected() {
        let members = members(&["A", "B"]);

        let zero = vec![expense(1, dec!(0), "A", &["A", "B"])];
        assert!(matches!(
            compute_balances(&members, &zero),
            Err(Error::InvalidExpense(_))
        ));

        let nobody = vec![expense(1, dec!(10), "A", &[])];
        assert!(matches!(
            compute_balances(&members, &nobody),
            Err(Error::InvalidExpense(_))
        ));
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let members = members(&["A", "B"]);
        let huge = dec!(50000000000000000000000000000);
        let expenses = vec![expense(1, huge, "A", &["B"]), expense(2, huge, "A", &["B"])];

        assert!(matches!(
            compute_balances(&members, &expenses),
            Err(Error::InvalidExpense(_))
        ));
    }

    #[test]
    fn test_largest_amounts_accumulate() {
        let members = members(&["A", "B", "C"]);
        let expenses: Vec<Expense> = (1..=50)
            .map(|id| expense(id, MAX_EXPENSE_AMOUNT, "A", &["B", "C"]))
            .collect();

        let balances = compute_balances(&members, &expenses).unwrap();
        assert_eq!(balance(&balances, "A"), MAX_EXPENSE_AMOUNT * dec!(50));
        assert_eq!(balance(&balances, "B"), MAX_EXPENSE_AMOUNT * dec!(-25));
        assert!(balances.total().is_zero());
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let members = members(&["Alice", "ALICE"]);

        assert!(matches!(
            compute_balances(&members, &[]),
            Err(Error::DuplicateMember(_))
        ));
    }

    #[test]
    fn test_idempotent() {
        let members = members(&["A", "B", "C"]);
        let expenses = vec![
            expense(1, dec!(10.01), "A", &["A", "B", "C"]),
            expense(2, dec!(7.77), "B", &["A", "C"]),
        ];

        let first = compute_balances(&members, &expenses).unwrap();
        let second = compute_balances(&members, &expenses).unwrap();

        assert_eq!(first, second);
    }
}
