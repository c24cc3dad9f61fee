//! # Book Module
//!
//! A catalog title with its copy-count inventory. `available_copies` is the
//! number of physical copies on the shelf; the lending workflow decrements
//! it on borrow and increments it on return. Invariant on every mutation:
//! `0 <= available_copies <= total_copies`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A title in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable external identifier (uuid v4)
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    /// Physical inventory size
    pub total_copies: i64,
    /// Copies currently on the shelf
    pub available_copies: i64,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Create a new book with all copies available.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        total_copies: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            author: author.into(),
            category: category.into(),
            isbn: None,
            published_year: None,
            description: None,
            total_copies,
            available_copies: total_copies,
            created_at: Utc::now(),
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_published_year(mut self, year: i64) -> Self {
        self.published_year = Some(year);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Repair the copy-count invariant after a catalog edit.
    ///
    /// Called explicitly when `total_copies` shrinks below the current
    /// availability, never as a hidden save hook.
    pub fn clamp_available(&mut self) {
        self.available_copies = self.available_copies.clamp(0, self.total_copies);
    }

    /// Number of copies currently out with patrons.
    pub fn copies_on_loan(&self) -> i64 {
        self.total_copies - self.available_copies
    }

    pub fn has_available_copy(&self) -> bool {
        self.available_copies > 0
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}/{} available)",
            self.title, self.author, self.available_copies, self.total_copies
        )
    }
}
