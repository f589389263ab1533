//! Core data types for the circulation domain.
//!
//! Entities carry stable identifiers (isbn, card id, loan id) and no
//! embedded object graphs; relationships are resolved through the stores.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lending policy constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirculationPolicy {
    /// Length of a loan, in days
    pub loan_period_days: i64,

    /// Maximum number of outstanding loans per borrower
    pub max_outstanding_loans: usize,

    /// Fine charged per overdue day, in cents
    pub daily_fine_cents: i64,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            max_outstanding_loans: 3,
            daily_fine_cents: 25,
        }
    }
}

/// A catalogued book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique catalog key
    pub isbn: String,

    /// Title
    pub title: String,

    /// Author names
    pub authors: Vec<String>,

    /// False iff exactly one outstanding loan references this book
    pub available: bool,
}

impl Book {
    pub fn new(isbn: impl Into<String>, title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            authors,
            available: true,
        }
    }
}

/// A registered borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Borrower {
    /// Unique card id
    pub card_id: String,

    /// Full name
    pub name: String,

    /// Contact email
    pub email: String,
}

impl Borrower {
    pub fn new(
        card_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A single lending of a book to a borrower.
///
/// Created at checkout, mutated exactly once at checkin, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier for this loan
    pub id: Uuid,

    /// Book this loan references
    pub isbn: String,

    /// Borrower this loan references
    pub card_id: String,

    /// When the book went out
    pub date_out: DateTime<Utc>,

    /// When the book is due back
    pub due_date: DateTime<Utc>,

    /// When the book came back; `None` means the loan is outstanding
    pub date_in: Option<DateTime<Utc>>,

    /// Overdue fine, if any has been assessed
    pub fine: Option<Fine>,
}

impl Loan {
    /// True while no return date has been recorded.
    pub fn is_outstanding(&self) -> bool {
        self.date_in.is_none()
    }
}

/// A monetary penalty attached to an overdue loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fine {
    /// Amount in cents; never negative
    pub amount_cents: i64,

    /// Whether the fine has been settled
    pub paid: bool,
}

impl Fine {
    pub fn unpaid(amount_cents: i64) -> Self {
        Self {
            amount_cents,
            paid: false,
        }
    }
}

/// Per-loan fine line used in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineSummary {
    pub loan_id: Uuid,
    pub card_id: String,
    pub amount_cents: i64,
    pub paid: bool,
}

impl FineSummary {
    pub fn for_loan(loan: &Loan, fine: &Fine) -> Self {
        Self {
            loan_id: loan.id,
            card_id: loan.card_id.clone(),
            amount_cents: fine.amount_cents,
            paid: fine.paid,
        }
    }
}

/// A borrower's fines with the total still owed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineReport {
    pub card_id: String,

    /// Sum of unpaid fine amounts, in cents
    pub total_due_cents: i64,

    pub fines: Vec<FineSummary>,
}

/// Compute the due date for a loan opened at `date_out`.
pub fn due_date_for(date_out: DateTime<Utc>, policy: &CirculationPolicy) -> DateTime<Utc> {
    date_out + Duration::days(policy.loan_period_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_constants() {
        let policy = CirculationPolicy::default();
        assert_eq!(policy.loan_period_days, 14);
        assert_eq!(policy.max_outstanding_loans, 3);
        assert_eq!(policy.daily_fine_cents, 25);
    }

    #[test]
    fn test_new_book_is_available() {
        let book = Book::new("9780134685991", "Effective Java", vec!["Joshua Bloch".into()]);
        assert!(book.available);
        assert_eq!(book.isbn, "9780134685991");
    }

    #[test]
    fn test_due_date_is_fourteen_days_out() {
        let policy = CirculationPolicy::default();
        let out = Utc::now();
        assert_eq!(due_date_for(out, &policy), out + Duration::days(14));
    }
}
