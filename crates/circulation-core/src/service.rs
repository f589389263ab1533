//! Checkout/checkin orchestration.
//!
//! `CirculationService` enforces cross-entity eligibility before delegating
//! state transitions to the ledger, then performs the ordered saves that
//! keep book availability and loan records in sync. Every validation runs
//! before the first write, so a failed request leaves no effects.
//!
//! Mutating operations take `&mut self`: one writer at a time, which makes
//! the check-then-set on availability and on the borrower's loan count
//! atomic. Front ends that serve concurrent requests wrap the service in a
//! lock.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CirculationError, Result};
use crate::ledger::LoanLedger;
use crate::model::{Book, Borrower, FineReport, FineSummary, Loan};
use crate::storage::{BookStore, BorrowerStore, LoanStore};

/// Orchestrator for the lending use-cases over a storage backend.
pub struct CirculationService<S> {
    store: S,
    ledger: LoanLedger,
}

impl<S> CirculationService<S>
where
    S: BookStore + BorrowerStore + LoanStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            ledger: LoanLedger::default(),
        }
    }

    pub fn with_ledger(store: S, ledger: LoanLedger) -> Self {
        Self { store, ledger }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the backend back, e.g. to persist a snapshot.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Check out a batch of books to a borrower.
    ///
    /// All-or-nothing: if any requested isbn is duplicated, missing, or
    /// unavailable, or the batch would push the borrower past the loan
    /// cap, no loan is created and no availability changes.
    pub fn checkout(
        &mut self,
        isbns: &[String],
        card_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Loan>> {
        let mut seen = HashSet::new();
        for isbn in isbns {
            if !seen.insert(isbn.as_str()) {
                return Err(CirculationError::DuplicateRequest(isbn.clone()));
            }
        }

        let borrower = self
            .store
            .find_by_card(card_id)?
            .ok_or_else(|| CirculationError::BorrowerNotFound(card_id.to_string()))?;

        let mut books = Vec::with_capacity(isbns.len());
        let mut unavailable = Vec::new();
        for isbn in isbns {
            match self.store.find_by_isbn(isbn)? {
                Some(book) if book.available => books.push(book),
                _ => unavailable.push(isbn.clone()),
            }
        }
        if !unavailable.is_empty() {
            return Err(CirculationError::BooksUnavailable(unavailable));
        }

        let outstanding = self
            .store
            .find_loans_by_borrower(card_id)?
            .iter()
            .filter(|loan| loan.is_outstanding())
            .count();
        let limit = self.ledger.policy().max_outstanding_loans;
        if outstanding + isbns.len() > limit {
            return Err(CirculationError::LoanLimitExceeded {
                outstanding,
                requested: isbns.len(),
                limit,
            });
        }

        // Eligibility settled; now the writes.
        let mut loans = Vec::with_capacity(books.len());
        for mut book in books {
            let loan = self.ledger.open_loan(&book.isbn, &borrower.card_id, now);
            book.available = false;
            self.store.save_loan(&loan)?;
            self.store.save_book(&book)?;
            loans.push(loan);
        }
        info!(
            card_id = %borrower.card_id,
            count = loans.len(),
            "checked out"
        );
        Ok(loans)
    }

    /// Record the return of a book by a borrower.
    ///
    /// Never fails for fine-state reasons: once the outstanding loan is
    /// found, closing it and assessing any fine always succeeds.
    pub fn checkin(&mut self, isbn: &str, card_id: &str, now: DateTime<Utc>) -> Result<Loan> {
        let mut loan = self
            .store
            .find_outstanding_by_book_and_borrower(isbn, card_id)?
            .ok_or_else(|| {
                CirculationError::LoanNotFound(format!("{} for borrower {}", isbn, card_id))
            })?;

        self.ledger.close_loan(&mut loan, now)?;

        let mut book = self
            .store
            .find_by_isbn(isbn)?
            .ok_or_else(|| CirculationError::Storage(format!("Book vanished: {}", isbn)))?;
        book.available = true;
        self.store.save_loan(&loan)?;
        self.store.save_book(&book)?;

        info!(card_id = %card_id, isbn = %isbn, fined = loan.fine.is_some(), "checked in");
        Ok(loan)
    }

    /// Settle the fine on a loan, addressed by loan id.
    pub fn pay_fine(&mut self, loan_id: Uuid) -> Result<Loan> {
        let mut loan = self
            .store
            .find_loan(loan_id)?
            .ok_or_else(|| CirculationError::LoanNotFound(loan_id.to_string()))?;
        self.ledger.pay_fine(&mut loan)?;
        self.store.save_loan(&loan)?;
        info!(loan_id = %loan_id, "fine paid");
        Ok(loan)
    }

    /// Sweep all outstanding loans, assessing fines as of `now`.
    ///
    /// Idempotent for a fixed `now`; safe to run periodically. Returns
    /// the number of loans whose fine was created or refreshed.
    pub fn update_fines(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let mut loans = self.store.find_all_outstanding()?;
        let changed = self.ledger.recompute_outstanding_fines(&mut loans, now);
        for loan in loans
            .iter()
            .filter(|loan| changed.contains(&loan.id))
        {
            self.store.save_loan(loan)?;
        }
        debug!(updated = changed.len(), "fine sweep complete");
        Ok(changed.len())
    }

    /// Catalog a book, returning the existing record if the isbn is
    /// already known.
    pub fn add_book(
        &mut self,
        isbn: &str,
        title: &str,
        authors: Vec<String>,
    ) -> Result<Book> {
        if let Some(existing) = self.store.find_by_isbn(isbn)? {
            return Ok(existing);
        }
        let book = Book::new(isbn, title, authors);
        self.store.save_book(&book)?;
        debug!(isbn = %isbn, "book catalogued");
        Ok(book)
    }

    /// Register a borrower under a freshly generated card id.
    pub fn register_borrower(&mut self, name: &str, email: &str) -> Result<Borrower> {
        let borrower = Borrower::new(Uuid::new_v4().to_string(), name, email);
        self.store.save_borrower(&borrower)?;
        info!(card_id = %borrower.card_id, "borrower registered");
        Ok(borrower)
    }

    pub fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        self.store.search_books(query)
    }

    /// Every loan referencing the borrower, outstanding or returned.
    pub fn loans_for_borrower(&self, card_id: &str) -> Result<Vec<Loan>> {
        self.store
            .find_by_card(card_id)?
            .ok_or_else(|| CirculationError::BorrowerNotFound(card_id.to_string()))?;
        self.store.find_loans_by_borrower(card_id)
    }

    /// The borrower's fines plus the total still owed.
    pub fn fine_report(&self, card_id: &str) -> Result<FineReport> {
        let loans = self.loans_for_borrower(card_id)?;
        let fines: Vec<FineSummary> = loans
            .iter()
            .filter_map(|loan| loan.fine.as_ref().map(|fine| FineSummary::for_loan(loan, fine)))
            .collect();
        let total_due_cents = fines
            .iter()
            .filter(|fine| !fine.paid)
            .map(|fine| fine.amount_cents)
            .sum();
        Ok(FineReport {
            card_id: card_id.to_string(),
            total_due_cents,
            fines,
        })
    }

    /// Every assessed fine in the system.
    pub fn all_fines(&self) -> Result<Vec<FineSummary>> {
        Ok(self
            .store
            .find_loans_with_fines()?
            .iter()
            .filter_map(|loan| loan.fine.as_ref().map(|fine| FineSummary::for_loan(loan, fine)))
            .collect())
    }
}
