//! Error types for circulation core operations.
//!
//! Every lending-rule violation is a distinct variant so callers can react
//! to the kind, not the message. Errors are descriptive at the core level;
//! the CLI layer maps them to user-facing output.

use thiserror::Error;

/// Result type alias for circulation operations.
pub type Result<T> = std::result::Result<T, CirculationError>;

/// Core error type for circulation operations.
///
/// All lending-rule variants are recoverable, caller-visible outcomes.
/// No operation leaves partial effects behind when it returns one of them.
#[derive(Debug, Error)]
pub enum CirculationError {
    /// No borrower registered under the given card id
    #[error("Borrower not found: {0}")]
    BorrowerNotFound(String),

    /// One or more requested books are missing from the catalog or
    /// currently checked out; the whole request is rejected
    #[error("Books unavailable: {}", .0.join(", "))]
    BooksUnavailable(Vec<String>),

    /// Granting the request would push the borrower past the loan cap
    #[error("Loan limit exceeded: {outstanding} outstanding + {requested} requested > {limit}")]
    LoanLimitExceeded {
        outstanding: usize,
        requested: usize,
        limit: usize,
    },

    /// The same isbn appears more than once in a single checkout request
    #[error("Duplicate isbn in request: {0}")]
    DuplicateRequest(String),

    /// No outstanding loan matches the given book and borrower
    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    /// The loan already has a return date recorded
    #[error("Loan already returned: {0}")]
    AlreadyReturned(uuid::Uuid),

    /// The loan carries no fine to pay
    #[error("No fine on loan: {0}")]
    NoFineOnLoan(uuid::Uuid),

    /// The loan's fine has already been settled
    #[error("Fine already paid on loan: {0}")]
    FineAlreadyPaid(uuid::Uuid),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for CirculationError {
    fn from(err: std::io::Error) -> Self {
        CirculationError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CirculationError {
    fn from(err: serde_json::Error) -> Self {
        CirculationError::Storage(err.to_string())
    }
}
