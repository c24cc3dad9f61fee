//! Lending workflow engine
//!
//! Borrow, return and renew, each executed as one SQLite transaction so a
//! failure anywhere rolls the whole operation back. Races on shared rows are
//! arbitrated by conditional updates: the borrow path's first statement is
//! the copy-count decrement itself, so the availability check and the
//! decrement are a single indivisible write.

use chrono::{Duration, Utc};
use libman_core::{loan, Loan, LoanDetail, LoanStatus, Validator, MAX_RENEWALS};
use libman_persistence::{BookRepo, Database, LoanRepo, PatronRepo};

use crate::error::{LendingError, LendingResult};

/// Orchestrates borrow/return/renew across the catalog, patron and ledger
/// stores.
#[derive(Clone)]
pub struct LendingService {
    db: Database,
}

impl LendingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Issue a loan: take one copy off the shelf and open a ledger entry.
    ///
    /// Fails with `NotFound` (book or user missing), `Unavailable` (no
    /// copies), `InactivePatron`, or `DuplicateBorrow` (open loan for the
    /// same pair already exists). Two concurrent borrows of the last copy
    /// cannot both succeed: the conditional decrement admits exactly one.
    pub async fn borrow(
        &self,
        book_id: &str,
        patron_id: &str,
        loan_days: i64,
    ) -> LendingResult<LoanDetail> {
        let mut v = Validator::new();
        v.require_text("bookId", book_id)
            .require_text("userId", patron_id)
            .require_positive("days", loan_days);
        v.finish()?;

        let mut tx = self.db.begin().await?;

        // Availability gate first: this write takes the SQLite write lock,
        // so everything after it sees a stable snapshot.
        if !BookRepo::try_checkout_copy(&mut *tx, book_id).await? {
            return match BookRepo::find(&mut *tx, book_id).await? {
                None => Err(LendingError::not_found("Book", book_id)),
                Some(_) => Err(LendingError::Unavailable {
                    book_id: book_id.to_string(),
                }),
            };
        }

        let patron = PatronRepo::find(&mut *tx, patron_id)
            .await?
            .ok_or_else(|| LendingError::not_found("User", patron_id))?;
        if !patron.is_active {
            return Err(LendingError::InactivePatron {
                patron_id: patron_id.to_string(),
            });
        }

        if LoanRepo::find_open_for(&mut *tx, book_id, patron_id)
            .await?
            .is_some()
        {
            return Err(LendingError::DuplicateBorrow {
                book_id: book_id.to_string(),
                patron_id: patron_id.to_string(),
            });
        }

        let loan = Loan::new(book_id, patron_id, loan_days, Utc::now());
        LoanRepo::insert(&mut *tx, &loan).await?;
        let detail = LoanRepo::detail(&mut *tx, &loan.id).await?.try_into()?;

        tx.commit().await.map_err(map_commit_err)?;

        tracing::info!(
            transaction = %loan.id,
            book = %book_id,
            user = %patron_id,
            due = %loan.due_date,
            "book borrowed"
        );
        Ok(detail)
    }

    /// Close a loan: put the copy back and settle the fine.
    ///
    /// The fine depends only on the due date and the return instant, so it
    /// comes out the same whether or not the sweeper already flipped the
    /// entry to overdue. A second return of the same transaction fails with
    /// `AlreadyReturned` and changes nothing.
    pub async fn return_loan(&self, loan_id: &str) -> LendingResult<LoanDetail> {
        let mut v = Validator::new();
        v.require_text("transactionId", loan_id);
        v.finish()?;

        let mut tx = self.db.begin().await?;

        let row = LoanRepo::find(&mut *tx, loan_id)
            .await?
            .ok_or_else(|| LendingError::not_found("Transaction", loan_id))?;
        let loan = Loan::try_from(row)?;
        if loan.status == LoanStatus::Returned {
            return Err(LendingError::AlreadyReturned {
                loan_id: loan_id.to_string(),
            });
        }

        let now = Utc::now();
        let fine = loan::fine_between(loan.due_date, now);

        // Keyed on return_date still being NULL; zero rows means a
        // concurrent return won the race.
        let changed =
            LoanRepo::mark_returned(&mut *tx, loan_id, now, &fine.to_string()).await?;
        if changed == 0 {
            return Err(LendingError::AlreadyReturned {
                loan_id: loan_id.to_string(),
            });
        }

        BookRepo::return_copy(&mut *tx, &loan.book_id).await?;
        let detail: LoanDetail = LoanRepo::detail(&mut *tx, loan_id).await?.try_into()?;

        tx.commit().await.map_err(map_commit_err)?;

        tracing::info!(
            transaction = %loan_id,
            book = %loan.book_id,
            fine = %fine,
            "book returned"
        );
        Ok(detail)
    }

    /// Extend a loan's due date. Only plain `borrowed` entries qualify, and
    /// only twice per loan. Copy counts are untouched.
    ///
    /// Deliberately does not re-check availability or whether the extension
    /// still lands in the past; the limit of two renewals is the only brake.
    pub async fn renew(&self, loan_id: &str, additional_days: i64) -> LendingResult<LoanDetail> {
        let mut v = Validator::new();
        v.require_text("transactionId", loan_id)
            .require_positive("additionalDays", additional_days);
        v.finish()?;

        let mut tx = self.db.begin().await?;

        let row = LoanRepo::find(&mut *tx, loan_id)
            .await?
            .ok_or_else(|| LendingError::not_found("Transaction", loan_id))?;
        let loan = Loan::try_from(row)?;
        if loan.status != LoanStatus::Borrowed {
            return Err(LendingError::InvalidState {
                loan_id: loan_id.to_string(),
                status: loan.status,
            });
        }
        if loan.renewal_count >= MAX_RENEWALS {
            return Err(LendingError::RenewalLimitExceeded {
                loan_id: loan_id.to_string(),
            });
        }

        let new_due = loan.due_date + Duration::days(additional_days);
        let changed =
            LoanRepo::mark_renewed(&mut *tx, loan_id, new_due, loan.renewal_count).await?;
        if changed == 0 {
            return Err(LendingError::Conflict(format!(
                "transaction {} changed during renewal",
                loan_id
            )));
        }

        let detail: LoanDetail = LoanRepo::detail(&mut *tx, loan_id).await?.try_into()?;
        tx.commit().await.map_err(map_commit_err)?;

        tracing::info!(
            transaction = %loan_id,
            due = %new_due,
            renewals = loan.renewal_count + 1,
            "loan renewed"
        );
        Ok(detail)
    }
}

/// A commit that loses the write lock is a retryable conflict, not a fault.
fn map_commit_err(err: sqlx::Error) -> LendingError {
    libman_persistence::PersistenceError::from(err).into()
}
