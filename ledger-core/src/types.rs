//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic iteration (member order is preserved, no hashing)
//! - Exact arithmetic (Decimal for money, rounded to cents at the edges)
//! - Plain serde serialization (JSON store, JSON reports)

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Tolerance used everywhere a balance or remaining amount is compared to zero (0.01)
pub const CENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest accepted expense amount (one trillion)
///
/// Keeps every balance and total of a group far inside `Decimal`'s range.
pub const MAX_EXPENSE_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Round to currency precision (2 dp), ties away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the amount is within one cent of zero
pub fn is_settled(amount: Decimal) -> bool {
    amount.abs() <= CENT_TOLERANCE
}

/// Group member, identified by display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    /// Create new member (surrounding whitespace is dropped)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.len() == name.len() {
            Self(name)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive name comparison, used for uniqueness within a group
    pub fn same_name(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Member {
    fn from(name: &str) -> Self {
        Member::new(name)
    }
}

impl AsRef<str> for Member {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Expense identifier, monotonic within a group
pub type ExpenseId = u64;

/// A single payment event: one payer, split evenly among participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID (assigned by the group, never reused)
    pub id: ExpenseId,

    /// What the money was spent on
    pub description: String,

    /// Amount paid (must be positive)
    pub amount: Decimal,

    /// Member who paid
    pub payer: Member,

    /// Members who benefited (non-empty, no duplicates)
    pub participants: Vec<Member>,
}

impl Expense {
    /// Per-participant share (`amount / |participants|`)
    ///
    /// Returns `None` when there are no participants.
    pub fn share(&self) -> Option<Decimal> {
        self.amount
            .checked_div(Decimal::from(self.participants.len()))
    }

    /// Whether the member paid for or took part in this expense
    pub fn involves(&self, member: &Member) -> bool {
        &self.payer == member || self.participants.contains(member)
    }

    /// Check the expense's own invariants (amount, participant set)
    ///
    /// Membership of the payer and participants is checked against a member
    /// list by the caller.
    pub fn validate(&self) -> crate::Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(crate::Error::InvalidExpense(format!(
                "expense {} has non-positive amount {}",
                self.id, self.amount
            )));
        }

        if self.amount > MAX_EXPENSE_AMOUNT {
            return Err(crate::Error::InvalidExpense(format!(
                "expense {} amount {} exceeds the maximum of {}",
                self.id, self.amount, MAX_EXPENSE_AMOUNT
            )));
        }

        if self.participants.is_empty() {
            return Err(crate::Error::InvalidExpense(format!(
                "expense {} has no participants",
                self.id
            )));
        }

        for (i, participant) in self.participants.iter().enumerate() {
            if self.participants[..i].contains(participant) {
                return Err(crate::Error::InvalidExpense(format!(
                    "expense {} lists {} twice",
                    self.id, participant
                )));
            }
        }

        Ok(())
    }
}

/// Expense before an ID has been assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    /// What the money was spent on
    pub description: String,

    /// Amount paid
    pub amount: Decimal,

    /// Name of the member who paid
    pub payer: String,

    /// Names of the members who benefited
    pub participants: Vec<String>,
}

/// Net position per member, in member order
///
/// Positive = is owed money, negative = owes money. Always derived from an
/// expense list, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    entries: Vec<(Member, Decimal)>,
}

impl Balances {
    /// All members at zero
    pub fn with_members(members: &[Member]) -> Self {
        Self {
            entries: members.iter().map(|m| (m.clone(), Decimal::ZERO)).collect(),
        }
    }

    /// Balance of a member
    pub fn get(&self, member: &Member) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(m, _)| m == member)
            .map(|(_, balance)| *balance)
    }

    /// Add `delta` to a member's balance, returns false if the member is unknown
    pub fn adjust(&mut self, member: &Member, delta: Decimal) -> bool {
        match self.entries.iter_mut().find(|(m, _)| m == member) {
            Some((_, balance)) => {
                *balance += delta;
                true
            }
            None => false,
        }
    }

    /// Add `delta` to a member's balance, failing on an unknown member or overflow
    pub fn try_adjust(&mut self, member: &Member, delta: Decimal) -> crate::Result<()> {
        let (_, balance) = self
            .entries
            .iter_mut()
            .find(|(m, _)| m == member)
            .ok_or_else(|| crate::Error::UnknownMember(member.to_string()))?;

        *balance = balance.checked_add(delta).ok_or_else(|| {
            crate::Error::InvariantViolation(format!("balance of {} overflows", member))
        })?;
        Ok(())
    }

    /// Iterate in member order
    pub fn iter(&self) -> impl Iterator<Item = (&Member, Decimal)> + '_ {
        self.entries.iter().map(|(m, balance)| (m, *balance))
    }

    /// Members in order
    pub fn members(&self) -> impl Iterator<Item = &Member> + '_ {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no members
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all balances (zero within rounding for a conserving ledger)
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, balance)| *balance).sum()
    }

    /// Round every balance to cents
    pub fn round_all(&mut self) {
        for (_, balance) in &mut self.entries {
            *balance = round_cents(*balance);
        }
    }

    /// True when every member is within one cent of zero
    pub fn is_all_settled(&self) -> bool {
        self.entries.iter().all(|(_, balance)| is_settled(*balance))
    }
}

impl FromIterator<(Member, Decimal)> for Balances {
    /// Repeated members are folded into their first entry
    fn from_iter<I: IntoIterator<Item = (Member, Decimal)>>(iter: I) -> Self {
        let mut balances = Balances::default();
        for (member, amount) in iter {
            if !balances.adjust(&member, amount) {
                balances.entries.push((member, amount));
            }
        }
        balances
    }
}

impl Serialize for Balances {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(m, balance)| (m, balance)))
    }
}
