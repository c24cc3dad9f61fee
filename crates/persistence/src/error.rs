//! Persistence layer errors

use thiserror::Error;

/// Errors from the SQLite stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),

    #[error("Invalid {column} value in row: {value}")]
    InvalidColumn { column: String, value: String },
}

/// Result type alias for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    /// Create a not-found error
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_column(column: &str, value: &str) -> Self {
        Self::InvalidColumn {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// True when the underlying SQLite write lost a lock race and the whole
    /// operation is safe to retry.
    pub fn is_busy(&self) -> bool {
        match self {
            PersistenceError::Database(sqlx::Error::Database(db)) => {
                let msg = db.message().to_lowercase();
                msg.contains("database is locked") || msg.contains("database is busy")
            }
            _ => false,
        }
    }

    /// True when a uniqueness constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PersistenceError::Database(sqlx::Error::Database(db)) => {
                db.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}
