//! # Libman Persistence
//!
//! SQLite storage for the three stores: catalog (`books`), patrons
//! (`patrons`) and the loan ledger (`loans`).
//!
//! The pool runs in WAL mode with a busy timeout; every lending operation
//! executes inside one [`sqlx`] transaction obtained from
//! [`Database::begin`]. Repositories expose find-by-id, filtered listing,
//! insert and the conditional updates the workflow serializes on.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libman_persistence::{Database, BookRepo};
//!
//! let db = Database::init("sqlite:libman.db?mode=rwc").await?;
//! let book = BookRepo::get(db.pool(), &book_id).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::repos::{BookFilter, BookRepo, LoanFilter, LoanRepo, PatronFilter, PatronRepo};
pub use sqlite::schema::{BookRow, LoanDetailRow, LoanRow, PatronRow};
pub use sqlite::{create_pool, create_schema, init_database};

use sqlx::{Sqlite, SqlitePool, Transaction};

/// Database facade - owns the SQLite pool.
///
/// Cheap to clone; clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to an existing database.
    pub async fn new(database_url: &str) -> PersistenceResult<Self> {
        let pool = sqlite::create_pool(database_url).await?;
        Ok(Self { pool })
    }

    /// Connect and bootstrap the schema.
    pub async fn init(database_url: &str) -> PersistenceResult<Self> {
        let pool = sqlite::init_database(database_url).await?;
        Ok(Self { pool })
    }

    /// Wrap an already-open pool (tests).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction; dropping it without commit rolls back.
    pub async fn begin(&self) -> PersistenceResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Cheap liveness probe for health checks.
    pub async fn ping(&self) -> PersistenceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
