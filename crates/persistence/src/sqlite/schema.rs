//! Row types for sqlx mapping from the SQLite tables, plus conversions
//! into the core domain types.

use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use libman_core::{Book, BookRef, Loan, LoanDetail, LoanStatus, Patron, PatronRef, PatronType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Row type for the `books` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            author: row.author,
            category: row.category,
            isbn: row.isbn,
            published_year: row.published_year,
            description: row.description,
            total_copies: row.total_copies,
            available_copies: row.available_copies,
            created_at: row.created_at,
        }
    }
}

/// Row type for the `patrons` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PatronRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub patron_type: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PatronRow> for Patron {
    type Error = PersistenceError;

    fn try_from(row: PatronRow) -> Result<Self, Self::Error> {
        let patron_type = PatronType::from_str(&row.patron_type)
            .ok_or_else(|| PersistenceError::invalid_column("patron_type", &row.patron_type))?;
        Ok(Patron {
            id: row.id,
            name: row.name,
            email: row.email,
            patron_type,
            department: row.department,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Row type for the `loans` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LoanRow {
    pub id: String,
    pub book_id: String,
    pub patron_id: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub renewal_count: i64,
    pub fine_amount: String, // Decimal stored as TEXT
}

impl TryFrom<LoanRow> for Loan {
    type Error = PersistenceError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        let status = LoanStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_column("status", &row.status))?;
        let fine_amount = Decimal::from_str(&row.fine_amount)
            .map_err(|e| PersistenceError::InvalidDecimal(e.to_string()))?;
        Ok(Loan {
            id: row.id,
            book_id: row.book_id,
            patron_id: row.patron_id,
            borrow_date: row.borrow_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status,
            renewal_count: row.renewal_count,
            fine_amount,
        })
    }
}

/// A loan row joined with its book and patron columns, for resolved views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoanDetailRow {
    pub id: String,
    pub book_id: String,
    pub patron_id: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub renewal_count: i64,
    pub fine_amount: String,
    pub book_title: String,
    pub book_author: String,
    pub book_category: String,
    pub patron_name: String,
    pub patron_email: String,
    pub patron_type: String,
}

impl TryFrom<LoanDetailRow> for LoanDetail {
    type Error = PersistenceError;

    fn try_from(row: LoanDetailRow) -> Result<Self, Self::Error> {
        let patron_type = PatronType::from_str(&row.patron_type)
            .ok_or_else(|| PersistenceError::invalid_column("patron_type", &row.patron_type))?;
        let book = BookRef {
            id: row.book_id.clone(),
            title: row.book_title,
            author: row.book_author,
            category: row.book_category,
        };
        let patron = PatronRef {
            id: row.patron_id.clone(),
            name: row.patron_name,
            email: row.patron_email,
            patron_type,
        };
        let loan = Loan::try_from(LoanRow {
            id: row.id,
            book_id: row.book_id,
            patron_id: row.patron_id,
            borrow_date: row.borrow_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status: row.status,
            renewal_count: row.renewal_count,
            fine_amount: row.fine_amount,
        })?;
        Ok(LoanDetail { loan, book, patron })
    }
}
