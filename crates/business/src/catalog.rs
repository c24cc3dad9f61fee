//! Catalog management
//!
//! CRUD glue over the book store. The only subtlety is the copy-count
//! invariant: edits that shrink `total_copies` re-clamp `available_copies`,
//! and a title cannot be deleted while ledger entries still hold copies.

use libman_core::{Book, Validator};
use libman_persistence::{BookFilter, BookRepo, Database, LoanRepo};

use crate::error::{LendingError, LendingResult};

/// Fields accepted when adding a book.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    pub total_copies: i64,
    /// Defaults to `total_copies` when absent
    pub available_copies: Option<i64>,
}

/// Partial update for a book; absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    pub total_copies: Option<i64>,
    pub available_copies: Option<i64>,
}

/// Book store management operations.
#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewBook) -> LendingResult<Book> {
        let mut v = Validator::new();
        v.require_text("title", &new.title)
            .require_text("author", &new.author)
            .require_text("category", &new.category)
            .require_positive("totalCopies", new.total_copies)
            .check_range("publishedYear", new.published_year, 1000, 2100);
        if let Some(available) = new.available_copies {
            v.require_non_negative("availableCopies", available);
            v.check(
                available <= new.total_copies,
                "availableCopies must not exceed totalCopies",
            );
        }
        v.finish()?;

        let mut book = Book::new(new.title, new.author, new.category, new.total_copies);
        book.isbn = new.isbn;
        book.published_year = new.published_year;
        book.description = new.description;
        if let Some(available) = new.available_copies {
            book.available_copies = available;
        }

        BookRepo::insert(self.db.pool(), &book).await?;
        tracing::info!(book = %book.id, title = %book.title, "book added to catalog");
        Ok(book)
    }

    pub async fn get(&self, id: &str) -> LendingResult<Book> {
        let row = BookRepo::get(self.db.pool(), id).await?;
        Ok(row.into())
    }

    /// Apply a partial edit, then repair the copy-count invariant before
    /// writing.
    pub async fn update(&self, id: &str, update: BookUpdate) -> LendingResult<Book> {
        let mut book: Book = BookRepo::get(self.db.pool(), id).await?.into();

        if let Some(title) = update.title {
            book.title = title;
        }
        if let Some(author) = update.author {
            book.author = author;
        }
        if let Some(category) = update.category {
            book.category = category;
        }
        if let Some(isbn) = update.isbn {
            book.isbn = Some(isbn);
        }
        if let Some(year) = update.published_year {
            book.published_year = Some(year);
        }
        if let Some(description) = update.description {
            book.description = Some(description);
        }
        if let Some(total) = update.total_copies {
            book.total_copies = total;
        }
        if let Some(available) = update.available_copies {
            book.available_copies = available;
        }

        let mut v = Validator::new();
        v.require_text("title", &book.title)
            .require_text("author", &book.author)
            .require_text("category", &book.category)
            .require_non_negative("totalCopies", book.total_copies)
            .require_non_negative("availableCopies", book.available_copies)
            .check_range("publishedYear", book.published_year, 1000, 2100);
        v.finish()?;

        book.clamp_available();
        BookRepo::update(self.db.pool(), &book).await?;
        Ok(book)
    }

    /// Remove a title. Refused while open loans still hold copies; loan
    /// history of returned copies keeps its rows but the title is gone.
    pub async fn delete(&self, id: &str) -> LendingResult<()> {
        let mut tx = self.db.begin().await?;

        BookRepo::get(&mut *tx, id).await?;
        let open = LoanRepo::open_count_for_book(&mut *tx, id).await?;
        if open > 0 {
            return Err(LendingError::Conflict(format!(
                "book {} has {} open loan(s) and cannot be deleted",
                id, open
            )));
        }
        BookRepo::delete(&mut *tx, id).await?;

        tx.commit()
            .await
            .map_err(libman_persistence::PersistenceError::from)?;
        tracing::info!(book = %id, "book removed from catalog");
        Ok(())
    }

    pub async fn list(&self, filter: &BookFilter) -> LendingResult<(Vec<Book>, i64)> {
        let (rows, total) = BookRepo::list(self.db.pool(), filter).await?;
        Ok((rows.into_iter().map(Book::from).collect(), total))
    }

    pub async fn categories(&self) -> LendingResult<Vec<String>> {
        Ok(BookRepo::categories(self.db.pool()).await?)
    }
}
