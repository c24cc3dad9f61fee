//! Business layer errors
//!
//! Every business-rule violation is a distinct variant so the API boundary
//! can map each one to a response; infrastructure faults stay separate under
//! [`LendingError::Storage`].

use libman_core::{LoanStatus, ValidationErrors};
use libman_persistence::PersistenceError;
use thiserror::Error;

/// Typed failures of the lending workflow and its surrounding services.
#[derive(Debug, Error)]
pub enum LendingError {
    // === Lookup and input errors ===
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // === Borrow rejections ===
    #[error("No copies of book {book_id} are available")]
    Unavailable { book_id: String },

    #[error("User {patron_id} is deactivated and cannot borrow")]
    InactivePatron { patron_id: String },

    #[error("User {patron_id} already has an open loan for book {book_id}")]
    DuplicateBorrow { book_id: String, patron_id: String },

    // === Return / renew rejections ===
    #[error("Transaction {loan_id} was already returned")]
    AlreadyReturned { loan_id: String },

    #[error("Transaction {loan_id} is {status} and cannot be renewed")]
    InvalidState { loan_id: String, status: LoanStatus },

    #[error("Transaction {loan_id} has reached the renewal limit")]
    RenewalLimitExceeded { loan_id: String },

    // === Concurrency ===
    #[error("Operation lost a concurrent update race, retry: {0}")]
    Conflict(String),

    // === Infrastructure ===
    #[error("Storage error: {0}")]
    Storage(PersistenceError),
}

/// Result type alias for business operations
pub type LendingResult<T> = Result<T, LendingError>;

impl LendingError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Business-rule rejections are expected outcomes; storage faults and
    /// lost races are not.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, LendingError::Conflict(_) | LendingError::Storage(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LendingError::Conflict(_))
    }
}

impl From<PersistenceError> for LendingError {
    fn from(err: PersistenceError) -> Self {
        if err.is_busy() {
            return LendingError::Conflict(err.to_string());
        }
        match err {
            PersistenceError::NotFound { entity, id } => LendingError::NotFound { entity, id },
            other => LendingError::Storage(other),
        }
    }
}

impl From<ValidationErrors> for LendingError {
    fn from(err: ValidationErrors) -> Self {
        LendingError::Validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LendingError::not_found("Book", "b-1");
        assert_eq!(err.to_string(), "Book not found: b-1");

        let err = LendingError::InvalidState {
            loan_id: "t-1".into(),
            status: LoanStatus::Returned,
        };
        assert!(err.to_string().contains("returned"));
    }

    #[test]
    fn test_classification() {
        assert!(LendingError::Unavailable { book_id: "b".into() }.is_business_rule());
        assert!(!LendingError::Conflict("locked".into()).is_business_rule());
        assert!(LendingError::Conflict("locked".into()).is_retryable());
    }

    #[test]
    fn test_persistence_not_found_maps_through() {
        let err: LendingError = PersistenceError::not_found("Transaction", "t-9").into();
        assert!(matches!(err, LendingError::NotFound { .. }));
        assert_eq!(err.to_string(), "Transaction not found: t-9");
    }
}
