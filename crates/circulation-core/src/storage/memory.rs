//! In-memory store with JSON snapshot persistence.
//!
//! `MemoryStore` backs all three store traits with ordered maps and
//! serializes the whole library to a single JSON file. The CLI loads the
//! snapshot, runs one operation, and writes it back atomically; tests use
//! it directly as a storage double.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CirculationError, Result};
use crate::model::{Book, Borrower, Loan};
use crate::storage::traits::{BookStore, BorrowerStore, LoanStore};

/// In-memory implementation of the book, borrower, and loan stores.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    books: BTreeMap<String, Book>,
    borrowers: BTreeMap<String, Borrower>,
    loans: BTreeMap<Uuid, Loan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::Storage` if the file is missing or not a
    /// valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            CirculationError::Storage(format!("Cannot read library {}: {}", path.display(), e))
        })?;
        let store = serde_json::from_slice(&bytes).map_err(|e| {
            CirculationError::Storage(format!("Invalid library snapshot: {}", e))
        })?;
        Ok(store)
    }

    /// Persist the snapshot to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_vec_pretty(self)?;
        crate::fs::write_atomic(path, &payload)
    }
}

impl BookStore for MemoryStore {
    fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        Ok(self.books.get(isbn).cloned())
    }

    fn save_book(&mut self, book: &Book) -> Result<()> {
        self.books.insert(book.isbn.clone(), book.clone());
        Ok(())
    }

    fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        let needle = query.to_lowercase();
        Ok(self
            .books
            .values()
            .filter(|book| {
                book.isbn.to_lowercase().contains(&needle)
                    || book.title.to_lowercase().contains(&needle)
                    || book
                        .authors
                        .iter()
                        .any(|author| author.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}

impl BorrowerStore for MemoryStore {
    fn find_by_card(&self, card_id: &str) -> Result<Option<Borrower>> {
        Ok(self.borrowers.get(card_id).cloned())
    }

    fn save_borrower(&mut self, borrower: &Borrower) -> Result<()> {
        self.borrowers
            .insert(borrower.card_id.clone(), borrower.clone());
        Ok(())
    }
}

impl LoanStore for MemoryStore {
    fn save_loan(&mut self, loan: &Loan) -> Result<()> {
        self.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn find_loan(&self, id: Uuid) -> Result<Option<Loan>> {
        Ok(self.loans.get(&id).cloned())
    }

    fn find_outstanding_by_book_and_borrower(
        &self,
        isbn: &str,
        card_id: &str,
    ) -> Result<Option<Loan>> {
        Ok(self
            .loans
            .values()
            .find(|loan| loan.isbn == isbn && loan.card_id == card_id && loan.is_outstanding())
            .cloned())
    }

    fn find_all_outstanding(&self) -> Result<Vec<Loan>> {
        Ok(self
            .loans
            .values()
            .filter(|loan| loan.is_outstanding())
            .cloned()
            .collect())
    }

    fn find_loans_by_borrower(&self, card_id: &str) -> Result<Vec<Loan>> {
        Ok(self
            .loans
            .values()
            .filter(|loan| loan.card_id == card_id)
            .cloned()
            .collect())
    }

    fn find_loans_with_fines(&self) -> Result<Vec<Loan>> {
        Ok(self
            .loans
            .values()
            .filter(|loan| loan.fine.is_some())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LoanLedger;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .save_book(&Book::new(
                "9780134685991",
                "Effective Java",
                vec!["Joshua Bloch".to_string()],
            ))
            .expect("save book should succeed");
        store
            .save_borrower(&Borrower::new("card-1", "Ada Lovelace", "ada@example.com"))
            .expect("save borrower should succeed");
        store
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().expect("tempdir should succeed");
        let path = dir.path().join("library.json");

        let mut store = sample_store();
        let loan = LoanLedger::default().open_loan("9780134685991", "card-1", Utc::now());
        store.save_loan(&loan).expect("save loan should succeed");
        store.save(&path).expect("save should succeed");

        let reloaded = MemoryStore::load(&path).expect("load should succeed");
        let found = reloaded
            .find_loan(loan.id)
            .expect("find should succeed")
            .expect("loan should be present");
        assert_eq!(found.isbn, "9780134685991");
        assert!(reloaded
            .find_by_isbn("9780134685991")
            .expect("find should succeed")
            .is_some());
        assert!(reloaded
            .find_by_card("card-1")
            .expect("find should succeed")
            .is_some());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().expect("tempdir should succeed");
        let result = MemoryStore::load(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_outstanding_lookup_ignores_returned_loans() {
        let mut store = sample_store();
        let ledger = LoanLedger::default();
        let now = Utc::now();

        let mut returned = ledger.open_loan("9780134685991", "card-1", now);
        ledger
            .close_loan(&mut returned, now)
            .expect("close should succeed");
        store.save_loan(&returned).expect("save should succeed");

        assert!(store
            .find_outstanding_by_book_and_borrower("9780134685991", "card-1")
            .expect("find should succeed")
            .is_none());

        let open = ledger.open_loan("9780134685991", "card-1", now);
        store.save_loan(&open).expect("save should succeed");
        let found = store
            .find_outstanding_by_book_and_borrower("9780134685991", "card-1")
            .expect("find should succeed")
            .expect("outstanding loan should be present");
        assert_eq!(found.id, open.id);
        assert_eq!(store.find_all_outstanding().expect("find").len(), 1);
    }

    #[test]
    fn test_search_books_matches_title_and_author() {
        let store = sample_store();
        assert_eq!(store.search_books("effective").expect("search").len(), 1);
        assert_eq!(store.search_books("bloch").expect("search").len(), 1);
        assert!(store.search_books("dickens").expect("search").is_empty());
    }
}
