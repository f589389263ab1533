//! Store trait definitions.
//!
//! These traits are the collaborator interfaces the orchestrator consumes.
//! They are deliberately narrow: lookup by key, save, and the loan queries
//! the lending rules need. One backend may implement all three.

use uuid::Uuid;

use crate::error::Result;
use crate::model::{Book, Borrower, Loan};

/// Catalog lookups and writes.
pub trait BookStore: Send + Sync {
    /// Get a book by its exact isbn.
    ///
    /// Returns `Ok(Some(book))` if catalogued, `Ok(None)` otherwise.
    fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// Insert or replace a book keyed by its isbn.
    fn save_book(&mut self, book: &Book) -> Result<()>;

    /// Case-insensitive substring match over isbn, title, and authors.
    fn search_books(&self, query: &str) -> Result<Vec<Book>>;
}

/// Borrower lookups and writes.
pub trait BorrowerStore: Send + Sync {
    /// Get a borrower by card id.
    fn find_by_card(&self, card_id: &str) -> Result<Option<Borrower>>;

    /// Insert or replace a borrower keyed by card id.
    fn save_borrower(&mut self, borrower: &Borrower) -> Result<()>;
}

/// Loan history storage.
///
/// Loans are append-only: `save_loan` either records a new loan or
/// replaces the stored copy of an existing one; nothing is ever deleted.
pub trait LoanStore: Send + Sync {
    /// Insert or replace a loan keyed by its id.
    fn save_loan(&mut self, loan: &Loan) -> Result<()>;

    /// Get a loan by id.
    fn find_loan(&self, id: Uuid) -> Result<Option<Loan>>;

    /// The outstanding loan matching both book and borrower, if any.
    ///
    /// At most one such loan can exist while the availability invariant
    /// holds.
    fn find_outstanding_by_book_and_borrower(
        &self,
        isbn: &str,
        card_id: &str,
    ) -> Result<Option<Loan>>;

    /// Every loan with no recorded return date.
    fn find_all_outstanding(&self) -> Result<Vec<Loan>>;

    /// Every loan (returned or not) referencing the borrower.
    fn find_loans_by_borrower(&self, card_id: &str) -> Result<Vec<Loan>>;

    /// Every loan carrying a fine, settled or not.
    fn find_loans_with_fines(&self) -> Result<Vec<Loan>>;
}
