//! # Loan Module
//!
//! One borrow lifecycle record, from issuance to return, plus the fine
//! rules.
//!
//! State machine:
//!
//! ```text
//! borrowed ──return──▶ returned (terminal)
//!    │
//!    └──sweep (past due)──▶ overdue ──return──▶ returned
//! ```
//!
//! A fine is a function of `due_date` and the return instant only; the
//! `status` column is never consulted, so a return charges the same fine
//! whether or not the sweeper already flipped the entry to overdue.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::patron::PatronType;

/// Default loan period when the caller does not specify one.
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Default extension granted by a renewal.
pub const DEFAULT_RENEWAL_DAYS: i64 = 7;

/// A loan can be renewed at most this many times.
pub const MAX_RENEWALS: i64 = 2;

/// Fine charged per overdue day, in currency units.
pub const FINE_RATE_PER_DAY: Decimal = dec!(5);

const SECONDS_PER_DAY: i64 = 86_400;

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Out with a patron, inside the loan period
    Borrowed,
    /// Out with a patron, past due (flipped by the sweeper)
    Overdue,
    /// Back on the shelf; terminal
    Returned,
}

impl LoanStatus {
    /// Code string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "borrowed" => Some(LoanStatus::Borrowed),
            "overdue" => Some(LoanStatus::Overdue),
            "returned" => Some(LoanStatus::Returned),
            _ => None,
        }
    }

    /// Open loans hold a copy of the book.
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Borrowed | LoanStatus::Overdue)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whole days a loan is overdue at `at`, rounded up.
///
/// Zero when `at` is at or before the due date; any positive overshoot,
/// however small, counts as a full day.
pub fn days_overdue(due_date: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let seconds = (at - due_date).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

/// Fine owed for a loan due at `due_date` and returned at `returned_at`.
pub fn fine_between(due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> Decimal {
    Decimal::from(days_overdue(due_date, returned_at)) * FINE_RATE_PER_DAY
}

/// One borrow event in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Generated at creation, never reused
    pub id: String,
    pub book_id: String,
    pub patron_id: String,
    /// Set at creation, immutable
    pub borrow_date: DateTime<Utc>,
    /// Moves forward only, via renewal
    pub due_date: DateTime<Utc>,
    /// Nil until returned, then immutable
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub renewal_count: i64,
    /// Computed once at return time, immutable after
    pub fine_amount: Decimal,
}

impl Loan {
    /// Issue a new loan starting at `now` for `loan_days` days.
    pub fn new(
        book_id: impl Into<String>,
        patron_id: impl Into<String>,
        loan_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.into(),
            patron_id: patron_id.into(),
            borrow_date: now,
            due_date: now + Duration::days(loan_days),
            return_date: None,
            status: LoanStatus::Borrowed,
            renewal_count: 0,
            fine_amount: Decimal::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn can_renew(&self) -> bool {
        self.status == LoanStatus::Borrowed && self.renewal_count < MAX_RENEWALS
    }

    /// Whole days overdue as of `at`; zero for returned or on-time loans.
    pub fn days_overdue_at(&self, at: DateTime<Utc>) -> i64 {
        match self.return_date {
            Some(returned) => days_overdue(self.due_date, returned),
            None => days_overdue(self.due_date, at),
        }
    }
}

/// Book fields joined onto a resolved loan for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRef {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
}

/// Patron fields joined onto a resolved loan for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronRef {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub patron_type: PatronType,
}

/// A loan with its book and patron details resolved, as returned by every
/// lending operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetail {
    #[serde(flatten)]
    pub loan: Loan,
    pub book: BookRef,
    pub patron: PatronRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("test timestamp")
    }

    #[test]
    fn test_status_str() {
        assert_eq!(LoanStatus::Borrowed.as_str(), "borrowed");
        assert_eq!(LoanStatus::from_str("OVERDUE"), Some(LoanStatus::Overdue));
        assert_eq!(LoanStatus::from_str("lost"), None);
        assert!(LoanStatus::Overdue.is_open());
        assert!(!LoanStatus::Returned.is_open());
    }

    #[test]
    fn test_new_loan() {
        let now = at("2026-03-01T10:00:00Z");
        let loan = Loan::new("book-1", "patron-1", 14, now);
        assert_eq!(loan.borrow_date, now);
        assert_eq!(loan.due_date, at("2026-03-15T10:00:00Z"));
        assert_eq!(loan.status, LoanStatus::Borrowed);
        assert_eq!(loan.renewal_count, 0);
        assert_eq!(loan.fine_amount, Decimal::ZERO);
        assert!(loan.return_date.is_none());
        assert!(loan.can_renew());
    }

    #[test]
    fn test_no_fine_at_due_date() {
        let due = at("2026-03-15T10:00:00Z");
        assert_eq!(fine_between(due, due), Decimal::ZERO);
        assert_eq!(days_overdue(due, due), 0);
    }

    #[test]
    fn test_no_fine_before_due_date() {
        let due = at("2026-03-15T10:00:00Z");
        let early = at("2026-03-10T10:00:00Z");
        assert_eq!(fine_between(due, early), Decimal::ZERO);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let due = at("2026-03-15T10:00:00Z");
        let just_after = at("2026-03-15T10:00:01Z");
        assert_eq!(days_overdue(due, just_after), 1);
        assert_eq!(fine_between(due, just_after), FINE_RATE_PER_DAY);
    }

    #[test]
    fn test_one_day_late() {
        let due = at("2026-03-15T10:00:00Z");
        let one_day = at("2026-03-16T10:00:00Z");
        assert_eq!(days_overdue(due, one_day), 1);
        assert_eq!(fine_between(due, one_day), FINE_RATE_PER_DAY);
    }

    #[test]
    fn test_twenty_five_hours_counts_as_two_days() {
        let due = at("2026-03-15T10:00:00Z");
        let late = at("2026-03-16T11:00:00Z");
        assert_eq!(days_overdue(due, late), 2);
        assert_eq!(fine_between(due, late), FINE_RATE_PER_DAY * Decimal::from(2));
    }

    #[test]
    fn test_three_days_late_fine() {
        let due = at("2026-03-15T10:00:00Z");
        let late = at("2026-03-18T10:00:00Z");
        assert_eq!(fine_between(due, late), Decimal::from(15));
    }

    #[test]
    fn test_renewal_gate() {
        let now = at("2026-03-01T10:00:00Z");
        let mut loan = Loan::new("book-1", "patron-1", 14, now);
        loan.renewal_count = MAX_RENEWALS;
        assert!(!loan.can_renew());

        loan.renewal_count = 1;
        loan.status = LoanStatus::Overdue;
        assert!(!loan.can_renew());
    }

    #[test]
    fn test_days_overdue_uses_return_date_when_present() {
        let now = at("2026-03-01T10:00:00Z");
        let mut loan = Loan::new("book-1", "patron-1", 1, now);
        loan.return_date = Some(at("2026-03-04T10:00:00Z"));
        // 2026-03-02 due, returned two days later; "now" far in the future
        assert_eq!(loan.days_overdue_at(at("2026-12-01T00:00:00Z")), 2);
    }
}
