//! # Circulation Core
//!
//! Core library for Circulation - a library lending system tracking the
//! catalog, borrowers, loans, and overdue fines.
//!
//! This crate provides the lending rules, storage abstractions, and data
//! models independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **model**: Books, borrowers, loans, fines, and the lending policy
//! - **ledger**: Loan state transitions and fine arithmetic
//! - **service**: Checkout/checkin orchestration over the stores
//! - **storage**: Store traits and the JSON-backed in-memory implementation
//!
//! Entities are referenced by stable identifiers (isbn, card id, loan id)
//! and relationships are resolved through store lookups rather than
//! embedded object graphs.

pub mod error;
pub mod fs;
pub mod ledger;
pub mod model;
pub mod service;
pub mod storage;

pub use error::{CirculationError, Result};
pub use ledger::LoanLedger;
pub use model::{Book, Borrower, CirculationPolicy, Fine, Loan};
pub use service::CirculationService;
pub use storage::{BookStore, BorrowerStore, LoanStore, MemoryStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
