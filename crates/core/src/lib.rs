//! # Libman Core
//!
//! Core domain types for the library backend - no I/O in this crate.
//!
//! - [`Book`] - a catalog title with copy-count inventory
//! - [`Patron`] - a library member (soft-deactivated, never deleted)
//! - [`Loan`] - one borrow lifecycle record, from issuance to return
//! - [`Validator`] - field validation that collects every violation
//!
//! Fine calculation lives here as a pure function of dates
//! ([`loan::fine_between`]) so that the return path and the tests share a
//! single implementation.

pub mod book;
pub mod loan;
pub mod patron;
pub mod validation;

pub use book::Book;
pub use loan::{
    BookRef, Loan, LoanDetail, LoanStatus, PatronRef, DEFAULT_LOAN_DAYS, DEFAULT_RENEWAL_DAYS,
    FINE_RATE_PER_DAY, MAX_RENEWALS,
};
pub use patron::{Patron, PatronType};
pub use validation::{ValidationErrors, Validator};
