//! Error-to-response mapping
//!
//! Business-rule rejections carry their own message out to the client;
//! storage faults are logged in full and leave only a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use libman_business::LendingError;
use libman_persistence::PersistenceError;

use crate::handlers::ApiResponse;

/// Wrapper so `?` works in handlers returning [`axum`] responses.
pub struct ApiError(pub LendingError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        Self(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        Self(LendingError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LendingError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            LendingError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            LendingError::InactivePatron { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string())
            }
            LendingError::Unavailable { .. }
            | LendingError::DuplicateBorrow { .. }
            | LendingError::AlreadyReturned { .. }
            | LendingError::InvalidState { .. }
            | LendingError::RenewalLimitExceeded { .. }
            | LendingError::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            LendingError::Storage(e) => {
                tracing::error!(error = %e, "storage failure while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                )
            }
        };

        (status, ApiResponse::<()>::error(message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ApiError(LendingError::not_found("Book", "b-1")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(LendingError::Unavailable {
            book_id: "b-1".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ApiError(LendingError::InactivePatron {
            patron_id: "u-1".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
