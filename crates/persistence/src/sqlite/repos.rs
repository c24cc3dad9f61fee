//! Repository implementations for the SQLite stores.
//!
//! Write-path methods take any executor so the business layer can run them
//! inside one transaction; list/count queries take the pool directly. The
//! conditional updates return the affected-row count and never read before
//! they write, which is what the lending workflow's race arbitration relies
//! on.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::{BookRow, LoanDetailRow, LoanRow, PatronRow};
use chrono::{DateTime, Utc};
use libman_core::{Book, Loan, Patron};
use sqlx::{SqliteExecutor, SqlitePool};

const LOAN_DETAIL_COLUMNS: &str = r#"
    l.id, l.book_id, l.patron_id, l.borrow_date, l.due_date, l.return_date,
    l.status, l.renewal_count, l.fine_amount,
    b.title AS book_title, b.author AS book_author, b.category AS book_category,
    p.name AS patron_name, p.email AS patron_email, p.patron_type AS patron_type
"#;

/// Filter and page window for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Free-text match over title, author and category
    pub search: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    pub page: i64,
    pub limit: i64,
}

/// Filter and page window for patron listings.
#[derive(Debug, Clone, Default)]
pub struct PatronFilter {
    /// Exact patron-type match
    pub patron_type: Option<String>,
    pub page: i64,
    pub limit: i64,
}

/// Filter and page window for ledger listings.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    /// Exact status match
    pub status: Option<String>,
    pub page: i64,
    pub limit: i64,
}

fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1) * limit
}

// ============================================================================
// Book Repository
// ============================================================================

/// Repository for the `books` table
pub struct BookRepo;

impl BookRepo {
    pub async fn insert(
        executor: impl SqliteExecutor<'_>,
        book: &Book,
    ) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, category, isbn, published_year,
                               description, total_copies, available_copies, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(book.published_year)
        .bind(&book.description)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find(
        executor: impl SqliteExecutor<'_>,
        id: &str,
    ) -> PersistenceResult<Option<BookRow>> {
        let row = sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn get(executor: impl SqliteExecutor<'_>, id: &str) -> PersistenceResult<BookRow> {
        Self::find(executor, id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Book", id))
    }

    /// Paged listing with optional free-text search and category filter.
    /// Returns the page plus the total match count.
    pub async fn list(
        pool: &SqlitePool,
        filter: &BookFilter,
    ) -> PersistenceResult<(Vec<BookRow>, i64)> {
        let mut conditions = Vec::new();
        if filter.search.is_some() {
            conditions.push("(title LIKE ? OR author LIKE ? OR category LIKE ?)");
        }
        if filter.category.is_some() {
            conditions.push("category = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let count_sql = format!("SELECT COUNT(*) FROM books{}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p).bind(p).bind(p);
        }
        if let Some(c) = &filter.category {
            count_query = count_query.bind(c);
        }
        let total = count_query.fetch_one(pool).await?;

        let page_sql = format!(
            "SELECT * FROM books{} ORDER BY title LIMIT ? OFFSET ?",
            where_clause
        );
        let mut page_query = sqlx::query_as::<_, BookRow>(&page_sql);
        if let Some(p) = &pattern {
            page_query = page_query.bind(p).bind(p).bind(p);
        }
        if let Some(c) = &filter.category {
            page_query = page_query.bind(c);
        }
        let rows = page_query
            .bind(filter.limit)
            .bind(page_offset(filter.page, filter.limit))
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Distinct categories, sorted.
    pub async fn categories(pool: &SqlitePool) -> PersistenceResult<Vec<String>> {
        let rows =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM books ORDER BY category")
                .fetch_all(pool)
                .await?;
        Ok(rows)
    }

    /// Overwrite the editable fields of a book.
    pub async fn update(executor: impl SqliteExecutor<'_>, book: &Book) -> PersistenceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = ?, author = ?, category = ?, isbn = ?, published_year = ?,
                description = ?, total_copies = ?, available_copies = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(book.published_year)
        .bind(&book.description)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(&book.id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Book", &book.id));
        }
        Ok(())
    }

    pub async fn delete(executor: impl SqliteExecutor<'_>, id: &str) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Book", id));
        }
        Ok(())
    }

    /// Availability gate of the borrow workflow: decrement one copy if and
    /// only if a copy is on the shelf. Returns whether a copy was taken.
    pub async fn try_checkout_copy(
        executor: impl SqliteExecutor<'_>,
        id: &str,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = ? AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Put a copy back on the shelf, clamped to `total_copies` in case the
    /// catalog shrank while the copy was out.
    pub async fn return_copy(executor: impl SqliteExecutor<'_>, id: &str) -> PersistenceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = MIN(available_copies + 1, total_copies)
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Book", id));
        }
        Ok(())
    }
}

// ============================================================================
// Patron Repository
// ============================================================================

/// Repository for the `patrons` table
pub struct PatronRepo;

impl PatronRepo {
    pub async fn insert(
        executor: impl SqliteExecutor<'_>,
        patron: &Patron,
    ) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO patrons (id, name, email, patron_type, department, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&patron.id)
        .bind(&patron.name)
        .bind(&patron.email)
        .bind(patron.patron_type.as_str())
        .bind(&patron.department)
        .bind(patron.is_active)
        .bind(patron.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find(
        executor: impl SqliteExecutor<'_>,
        id: &str,
    ) -> PersistenceResult<Option<PatronRow>> {
        let row = sqlx::query_as::<_, PatronRow>("SELECT * FROM patrons WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn get(executor: impl SqliteExecutor<'_>, id: &str) -> PersistenceResult<PatronRow> {
        Self::find(executor, id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", id))
    }

    /// Paged listing with optional patron-type filter.
    pub async fn list(
        pool: &SqlitePool,
        filter: &PatronFilter,
    ) -> PersistenceResult<(Vec<PatronRow>, i64)> {
        let where_clause = if filter.patron_type.is_some() {
            " WHERE patron_type = ?"
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM patrons{}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(t) = &filter.patron_type {
            count_query = count_query.bind(t);
        }
        let total = count_query.fetch_one(pool).await?;

        let page_sql = format!(
            "SELECT * FROM patrons{} ORDER BY name LIMIT ? OFFSET ?",
            where_clause
        );
        let mut page_query = sqlx::query_as::<_, PatronRow>(&page_sql);
        if let Some(t) = &filter.patron_type {
            page_query = page_query.bind(t);
        }
        let rows = page_query
            .bind(filter.limit)
            .bind(page_offset(filter.page, filter.limit))
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Overwrite the editable fields of a patron.
    pub async fn update(
        executor: impl SqliteExecutor<'_>,
        patron: &Patron,
    ) -> PersistenceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE patrons
            SET name = ?, email = ?, patron_type = ?, department = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&patron.name)
        .bind(&patron.email)
        .bind(patron.patron_type.as_str())
        .bind(&patron.department)
        .bind(patron.is_active)
        .bind(&patron.id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", &patron.id));
        }
        Ok(())
    }

    /// Soft-delete: flip `is_active` off, keeping history intact.
    pub async fn set_active(
        executor: impl SqliteExecutor<'_>,
        id: &str,
        active: bool,
    ) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE patrons SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }
}

// ============================================================================
// Loan Repository
// ============================================================================

/// Repository for the `loans` table
pub struct LoanRepo;

impl LoanRepo {
    pub async fn insert(executor: impl SqliteExecutor<'_>, loan: &Loan) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (id, book_id, patron_id, borrow_date, due_date,
                               return_date, status, renewal_count, fine_amount)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.book_id)
        .bind(&loan.patron_id)
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status.as_str())
        .bind(loan.renewal_count)
        .bind(loan.fine_amount.to_string())
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find(
        executor: impl SqliteExecutor<'_>,
        id: &str,
    ) -> PersistenceResult<Option<LoanRow>> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// The open (borrowed or overdue) loan for a (book, patron) pair, if any.
    pub async fn find_open_for(
        executor: impl SqliteExecutor<'_>,
        book_id: &str,
        patron_id: &str,
    ) -> PersistenceResult<Option<LoanRow>> {
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT * FROM loans
            WHERE book_id = ? AND patron_id = ? AND status IN ('borrowed', 'overdue')
            "#,
        )
        .bind(book_id)
        .bind(patron_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Number of open loans holding copies of a book.
    pub async fn open_count_for_book(
        executor: impl SqliteExecutor<'_>,
        book_id: &str,
    ) -> PersistenceResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM loans WHERE book_id = ? AND status IN ('borrowed', 'overdue')",
        )
        .bind(book_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Close a loan, keyed on it not being returned yet. Returns the
    /// affected-row count: zero means another return got there first.
    pub async fn mark_returned(
        executor: impl SqliteExecutor<'_>,
        id: &str,
        returned_at: DateTime<Utc>,
        fine_amount: &str,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'returned', return_date = ?, fine_amount = ?
            WHERE id = ? AND return_date IS NULL
            "#,
        )
        .bind(returned_at)
        .bind(fine_amount)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Extend a loan, keyed on the status and renewal count observed by the
    /// caller. Returns the affected-row count: zero means the loan changed
    /// underneath us.
    pub async fn mark_renewed(
        executor: impl SqliteExecutor<'_>,
        id: &str,
        new_due_date: DateTime<Utc>,
        expected_renewals: i64,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET due_date = ?, renewal_count = renewal_count + 1
            WHERE id = ? AND status = 'borrowed' AND renewal_count = ?
            "#,
        )
        .bind(new_due_date)
        .bind(id)
        .bind(expected_renewals)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// The overdue sweep: flip every stale borrowed entry in one conditional
    /// update. Entries returned or renewed concurrently no longer match the
    /// `status = 'borrowed' AND due_date < now` predicate at write time.
    pub async fn mark_overdue_batch(
        executor: impl SqliteExecutor<'_>,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            "UPDATE loans SET status = 'overdue' WHERE status = 'borrowed' AND due_date < ?",
        )
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// One resolved loan (book and patron joined).
    pub async fn detail(
        executor: impl SqliteExecutor<'_>,
        id: &str,
    ) -> PersistenceResult<LoanDetailRow> {
        let sql = format!(
            r#"
            SELECT {LOAN_DETAIL_COLUMNS}
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN patrons p ON p.id = l.patron_id
            WHERE l.id = ?
            "#
        );
        sqlx::query_as::<_, LoanDetailRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Transaction", id))
    }

    /// Paged resolved listing, newest first, with optional status filter.
    pub async fn list(
        pool: &SqlitePool,
        filter: &LoanFilter,
    ) -> PersistenceResult<(Vec<LoanDetailRow>, i64)> {
        let where_clause = if filter.status.is_some() {
            " WHERE l.status = ?"
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM loans l{}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(s) = &filter.status {
            count_query = count_query.bind(s);
        }
        let total = count_query.fetch_one(pool).await?;

        let page_sql = format!(
            r#"
            SELECT {LOAN_DETAIL_COLUMNS}
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN patrons p ON p.id = l.patron_id
            {where_clause}
            ORDER BY l.borrow_date DESC
            LIMIT ? OFFSET ?
            "#
        );
        let mut page_query = sqlx::query_as::<_, LoanDetailRow>(&page_sql);
        if let Some(s) = &filter.status {
            page_query = page_query.bind(s);
        }
        let rows = page_query
            .bind(filter.limit)
            .bind(page_offset(filter.page, filter.limit))
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Every loan currently past due: entries the sweeper already flipped
    /// plus stale borrowed entries it has not reached yet.
    pub async fn list_overdue(
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Vec<LoanDetailRow>> {
        let sql = format!(
            r#"
            SELECT {LOAN_DETAIL_COLUMNS}
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN patrons p ON p.id = l.patron_id
            WHERE l.status = 'overdue'
               OR (l.status = 'borrowed' AND l.due_date < ?)
            ORDER BY l.due_date
            "#
        );
        let rows = sqlx::query_as::<_, LoanDetailRow>(&sql)
            .bind(now)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}
