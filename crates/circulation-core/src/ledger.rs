//! Loan state transitions and fine arithmetic.
//!
//! `LoanLedger` is authoritative for the lending rules: how a loan opens
//! and closes, how overdue fines are assessed, and how they are settled.
//! It holds no storage; the orchestrator persists whatever it returns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CirculationError, Result};
use crate::model::{due_date_for, CirculationPolicy, Fine, Loan};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Rules engine for loan transitions and fine assessment.
#[derive(Debug, Clone, Default)]
pub struct LoanLedger {
    policy: CirculationPolicy,
}

impl LoanLedger {
    pub fn new(policy: CirculationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CirculationPolicy {
        &self.policy
    }

    /// Construct a new outstanding loan checked out at `now`.
    ///
    /// Eligibility must already have been verified by the caller; this
    /// never fails and touches nothing beyond the returned value.
    pub fn open_loan(
        &self,
        isbn: impl Into<String>,
        card_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            isbn: isbn.into(),
            card_id: card_id.into(),
            date_out: now,
            due_date: due_date_for(now, &self.policy),
            date_in: None,
            fine: None,
        }
    }

    /// Record the return of an outstanding loan at `now`.
    ///
    /// Assesses an unpaid fine if the return is past the due date. A fine
    /// already settled while the loan was out is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::AlreadyReturned` if the loan has a
    /// return date; the loan (fine included) is not modified in that case.
    pub fn close_loan(&self, loan: &mut Loan, now: DateTime<Utc>) -> Result<()> {
        if loan.date_in.is_some() {
            return Err(CirculationError::AlreadyReturned(loan.id));
        }
        loan.date_in = Some(now);

        let paid = loan.fine.as_ref().is_some_and(|fine| fine.paid);
        if !paid {
            if let Some(cents) = self.assessed_fine_cents(loan.due_date, now) {
                loan.fine = Some(Fine::unpaid(cents));
            }
        }
        Ok(())
    }

    /// Refresh fines on every outstanding, overdue loan as of `now`.
    ///
    /// Loans carrying a paid fine, or not yet past due, are left alone.
    /// Returns the ids of loans whose fine was created or changed so the
    /// caller can persist exactly those. Idempotent for a fixed `now`:
    /// the fine amount is set to the assessed value, not incremented.
    pub fn recompute_outstanding_fines(
        &self,
        loans: &mut [Loan],
        now: DateTime<Utc>,
    ) -> Vec<Uuid> {
        let mut changed = Vec::new();
        for loan in loans.iter_mut().filter(|loan| loan.is_outstanding()) {
            if loan.fine.as_ref().is_some_and(|fine| fine.paid) {
                continue;
            }
            let Some(cents) = self.assessed_fine_cents(loan.due_date, now) else {
                continue;
            };
            if loan.fine.as_ref().map(|fine| fine.amount_cents) != Some(cents) {
                loan.fine = Some(Fine::unpaid(cents));
                changed.push(loan.id);
            }
        }
        changed
    }

    /// Settle the fine on a loan.
    ///
    /// Payment only flips the paid flag; the amount is never altered.
    /// Valid whether the loan is still out or already returned.
    ///
    /// # Errors
    ///
    /// Returns `NoFineOnLoan` if the loan carries no fine, or
    /// `FineAlreadyPaid` if it has already been settled.
    pub fn pay_fine(&self, loan: &mut Loan) -> Result<()> {
        match loan.fine.as_mut() {
            None => Err(CirculationError::NoFineOnLoan(loan.id)),
            Some(fine) if fine.paid => Err(CirculationError::FineAlreadyPaid(loan.id)),
            Some(fine) => {
                fine.paid = true;
                Ok(())
            }
        }
    }

    /// Fine owed for a loan due at `due` evaluated at `at`, or `None` if
    /// not overdue. Any partial day past due bills a full day.
    fn assessed_fine_cents(&self, due: DateTime<Utc>, at: DateTime<Utc>) -> Option<i64> {
        let overdue_millis = (at - due).num_milliseconds();
        if overdue_millis <= 0 {
            return None;
        }
        let days = (overdue_millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        Some(days * self.policy.daily_fine_cents)
    }
}
