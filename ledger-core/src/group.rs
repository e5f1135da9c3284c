//! Group of members sharing expenses
//!
//! A [`Group`] owns one group's member list, expense list and expense-id
//! counter. It is the caller that keeps the balance calculator's
//! preconditions true:
//!
//! - member names are unique (case-insensitive) and non-empty
//! - every expense references existing members only
//! - removing a member first removes every expense involving them
//!
//! # Example
//!
//! ```
//! use ledger_core::{Group, NewExpense};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> ledger_core::Result<()> {
//! let mut group = Group::new("Ski trip")?;
//! group.add_member("Alice")?;
//! group.add_member("Bob")?;
//!
//! group.add_expense(NewExpense {
//!     description: "Cabin".to_string(),
//!     amount: Decimal::from(300),
//!     payer: "Alice".to_string(),
//!     participants: vec!["Alice".to_string(), "Bob".to_string()],
//! })?;
//!
//! let balances = group.balances()?;
//! assert_eq!(balances.total(), Decimal::ZERO);
//! # Ok(())
//! # }
//! ```

use crate::{
    balance::compute_balances,
    types::{Balances, Expense, ExpenseId, Member, NewExpense},
    Error, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Minimum number of members before settlements are worth computing
pub const MIN_MEMBERS_FOR_SETTLEMENT: usize = 2;

/// A named group with its members and expenses
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Group name (store key)
    pub name: String,

    /// Members in the order they were added
    members: Vec<Member>,

    /// Expenses in the order they were added
    expenses: Vec<Expense>,

    /// ID for the next expense
    next_expense_id: ExpenseId,

    /// Last time the group was saved
    pub saved_at: DateTime<Utc>,
}

impl Group {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidGroup("group name must not be empty".to_string()));
        }

        Ok(Self {
            name,
            members: Vec::new(),
            expenses: Vec::new(),
            next_expense_id: 1,
            saved_at: Utc::now(),
        })
    }

    /// Rebuild a group from stored parts
    ///
    /// Every expense is checked against the member list. When the ID counter
    /// is missing it resumes after the highest existing expense ID.
    pub fn from_parts(
        name: impl Into<String>,
        members: Vec<Member>,
        expenses: Vec<Expense>,
        next_expense_id: Option<ExpenseId>,
        saved_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut group = Self::new(name)?;
        for member in members {
            group.add_member(member.as_str())?;
        }

        for (i, expense) in expenses.iter().enumerate() {
            group.check_expense(expense)?;
            if expenses[..i].iter().any(|e| e.id == expense.id) {
                return Err(Error::InvariantViolation(format!(
                    "expense ID {} used twice",
                    expense.id
                )));
            }
        }

        let after_highest = expenses.iter().map(|e| e.id).max().map_or(1, |id| id + 1);
        group.next_expense_id = match next_expense_id {
            Some(next) if next >= after_highest => next,
            Some(next) => {
                tracing::warn!(
                    group = %group.name,
                    next,
                    after_highest,
                    "Stored expense counter behind existing IDs, advancing"
                );
                after_highest
            }
            None => after_highest,
        };
        group.expenses = expenses;
        group.saved_at = saved_at;

        Ok(group)
    }

    /// Members in insertion order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Expenses in insertion order
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// ID the next expense will receive
    pub fn next_expense_id(&self) -> ExpenseId {
        self.next_expense_id
    }

    /// Find a member by exact name, falling back to a case-insensitive match
    pub fn find_member(&self, name: &str) -> Option<&Member> {
        let name = name.trim();
        self.members
            .iter()
            .find(|m| m.as_str() == name)
            .or_else(|| self.members.iter().find(|m| m.same_name(name)))
    }

    /// Add a member
    pub fn add_member(&mut self, name: &str) -> Result<&Member> {
        let member = Member::new(name);
        if member.as_str().is_empty() {
            return Err(Error::InvalidMember("member name must not be empty".to_string()));
        }

        if self.members.iter().any(|m| m.same_name(member.as_str())) {
            return Err(Error::DuplicateMember(member.to_string()));
        }

        tracing::debug!(group = %self.name, member = %member, "Adding member");
        self.members.push(member);
        Ok(&self.members[self.members.len() - 1])
    }

    /// Expenses in which the member pays or takes part
    pub fn expenses_involving(&self, member: &Member) -> Vec<&Expense> {
        self.expenses.iter().filter(|e| e.involves(member)).collect()
    }

    /// Remove a member and every expense involving them
    ///
    /// Returns the removed expenses.
    pub fn remove_member(&mut self, name: &str) -> Result<Vec<Expense>> {
        let member = self
            .find_member(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMember(name.trim().to_string()))?;

        let (removed, kept): (Vec<Expense>, Vec<Expense>) = std::mem::take(&mut self.expenses)
            .into_iter()
            .partition(|e| e.involves(&member));
        self.expenses = kept;
        self.members.retain(|m| m != &member);

        tracing::debug!(
            group = %self.name,
            member = %member,
            removed_expenses = removed.len(),
            "Removed member"
        );

        Ok(removed)
    }

    /// Record a new expense, returns its ID
    pub fn add_expense(&mut self, new: NewExpense) -> Result<ExpenseId> {
        let description = new.description.trim().to_string();
        if description.is_empty() {
            return Err(Error::InvalidExpense("description must not be empty".to_string()));
        }

        let payer = self
            .find_member(&new.payer)
            .cloned()
            .ok_or_else(|| Error::UnknownMember(new.payer.trim().to_string()))?;

        let participants = new
            .participants
            .iter()
            .map(|name| {
                self.find_member(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownMember(name.trim().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let expense = Expense {
            id: self.next_expense_id,
            description,
            amount: new.amount,
            payer,
            participants,
        };
        expense.validate()?;

        self.next_expense_id += 1;
        let id = expense.id;

        tracing::debug!(
            group = %self.name,
            expense_id = id,
            amount = %expense.amount,
            payer = %expense.payer,
            participants = expense.participants.len(),
            "Added expense"
        );
        self.expenses.push(expense);

        Ok(id)
    }

    /// Delete an expense by ID
    pub fn remove_expense(&mut self, id: ExpenseId) -> Result<Expense> {
        let index = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::ExpenseNotFound(id))?;
        Ok(self.expenses.remove(index))
    }

    /// Drop every expense, keeping the members
    ///
    /// The ID counter keeps counting so IDs are never handed out twice.
    pub fn clear_expenses(&mut self) -> usize {
        let count = self.expenses.len();
        self.expenses.clear();
        count
    }

    /// Sum of all expense amounts
    ///
    /// Every stored expense is capped at `MAX_EXPENSE_AMOUNT`, so the sum stays
    /// within range.
    pub fn total_spent(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// At least two members and one expense
    pub fn is_ready(&self) -> bool {
        self.members.len() >= MIN_MEMBERS_FOR_SETTLEMENT && !self.expenses.is_empty()
    }

    /// Net balance of every member
    pub fn balances(&self) -> Result<Balances> {
        compute_balances(&self.members, &self.expenses)
    }

    /// Stamp the save time
    pub fn touch(&mut self) {
        self.saved_at = Utc::now();
    }

    fn check_expense(&self, expense: &Expense) -> Result<()> {
        expense.validate()?;
        for member in std::iter::once(&expense.payer).chain(&expense.participants) {
            if !self.members.contains(member) {
                return Err(Error::InvariantViolation(format!(
                    "expense {} references unknown member {}",
                    expense.id, member
                )));
            }
        }
        Ok(())
    }
}
