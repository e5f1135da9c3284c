//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Expense rejected (non-positive amount, empty participants, ...)
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// Member name rejected (empty after trimming)
    #[error("Invalid member: {0}")]
    InvalidMember(String),

    /// Member name already taken (case-insensitive)
    #[error("Duplicate member: {0}")]
    DuplicateMember(String),

    /// Member not part of the group
    #[error("Unknown member: {0}")]
    UnknownMember(String),

    /// Expense not found
    #[error("Expense not found: {0}")]
    ExpenseNotFound(u64),

    /// Group name rejected (empty after trimming)
    #[error("Invalid group: {0}")]
    InvalidGroup(String),

    /// Group not found in the store
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Group name already taken in the store
    #[error("Group already exists: {0}")]
    GroupExists(String),

    /// Invariant violation (money conservation, referential integrity, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
