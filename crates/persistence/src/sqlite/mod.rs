//! SQLite storage: connection setup, schema bootstrap, repositories.

pub mod repos;
pub mod schema;

use crate::error::PersistenceResult;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// How long a writer waits for the SQLite write lock before the operation
/// surfaces as a retryable conflict.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection pool in WAL mode with a busy timeout, creating the
/// database file when missing.
pub async fn create_pool(database_url: &str) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the pool and bootstrap the schema.
pub async fn init_database(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(database_url).await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes. Idempotent, so init can run on every
/// startup.
pub async fn create_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::query(
        r#"
        -- Catalog: copy-count inventory per title
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            category TEXT NOT NULL,
            isbn TEXT,
            published_year INTEGER,
            description TEXT,
            total_copies INTEGER NOT NULL DEFAULT 1,
            available_copies INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL,
            CHECK (available_copies >= 0),
            CHECK (available_copies <= total_copies)
        );

        -- Patrons (soft-deactivated, never deleted)
        CREATE TABLE IF NOT EXISTS patrons (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            patron_type TEXT NOT NULL,
            department TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL
        );

        -- Loan ledger: one row per borrow event
        CREATE TABLE IF NOT EXISTS loans (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            patron_id TEXT NOT NULL,
            borrow_date DATETIME NOT NULL,
            due_date DATETIME NOT NULL,
            return_date DATETIME,
            status TEXT NOT NULL DEFAULT 'borrowed',
            renewal_count INTEGER NOT NULL DEFAULT 0,
            fine_amount TEXT NOT NULL DEFAULT '0',
            FOREIGN KEY (book_id) REFERENCES books(id),
            FOREIGN KEY (patron_id) REFERENCES patrons(id)
        );

        CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status);
        CREATE INDEX IF NOT EXISTS idx_loans_patron ON loans(patron_id);
        CREATE INDEX IF NOT EXISTS idx_loans_book ON loans(book_id);

        -- At most one open loan per (book, patron) pair
        CREATE UNIQUE INDEX IF NOT EXISTS idx_loans_open_pair
            ON loans(book_id, patron_id)
            WHERE status IN ('borrowed', 'overdue');
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::sqlite::repos::{BookRepo, LoanRepo, PatronRepo};
    use libman_core::{Book, Loan, Patron};

    async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("schema-test.db").display()
        );
        let pool = init_database(&url).await.expect("init");
        (pool, dir)
    }

    #[tokio::test]
    async fn schema_bootstrap_is_idempotent() {
        let (pool, _dir) = test_pool().await;
        create_schema(&pool).await.expect("second bootstrap");
        create_schema(&pool).await.expect("third bootstrap");
    }

    #[tokio::test]
    async fn open_pair_index_rejects_second_open_loan() {
        let (pool, _dir) = test_pool().await;
        let book = Book::new("Dune", "Frank Herbert", "Science Fiction", 5);
        let patron = Patron::student("Alice", "alice@example.edu");
        BookRepo::insert(&pool, &book).await.unwrap();
        PatronRepo::insert(&pool, &patron).await.unwrap();

        let now = chrono::Utc::now();
        let first = Loan::new(&book.id, &patron.id, 14, now);
        LoanRepo::insert(&pool, &first).await.unwrap();

        // Second open loan for the same pair trips the partial unique index
        let second = Loan::new(&book.id, &patron.id, 14, now);
        let err = LoanRepo::insert(&pool, &second).await.unwrap_err();
        assert!(err.is_unique_violation(), "got: {err}");

        // After the first one closes, a new loan for the pair is fine again
        LoanRepo::mark_returned(&pool, &first.id, now, "0").await.unwrap();
        let third = Loan::new(&book.id, &patron.id, 14, now);
        LoanRepo::insert(&pool, &third).await.unwrap();
    }

    #[tokio::test]
    async fn copy_count_checks_hold_at_the_store() {
        let (pool, _dir) = test_pool().await;
        let mut book = Book::new("Dune", "Frank Herbert", "Science Fiction", 1);
        BookRepo::insert(&pool, &book).await.unwrap();

        // Raising available above total violates the table check
        book.available_copies = 2;
        let err = BookRepo::update(&pool, &book).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Database(_)));

        // The conditional decrement stops at zero instead of going negative
        assert!(BookRepo::try_checkout_copy(&pool, &book.id).await.unwrap());
        assert!(!BookRepo::try_checkout_copy(&pool, &book.id).await.unwrap());
    }
}
