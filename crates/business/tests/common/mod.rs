//! Shared test fixtures: a fresh SQLite database per test plus seeding
//! helpers.

// Not every test binary uses every helper.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use libman_business::{
    CatalogService, LendingService, NewBook, NewPatron, OverdueSweeper, PatronService,
};
use libman_core::{Book, Patron};
use libman_persistence::Database;
use tempfile::TempDir;

pub struct TestContext {
    pub db: Database,
    pub lending: LendingService,
    pub catalog: CatalogService,
    pub patrons: PatronService,
    pub sweeper: OverdueSweeper,
    _dir: TempDir,
}

pub async fn setup() -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("libman-test.db");
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let db = Database::init(&url).await.expect("init test db");

    TestContext {
        lending: LendingService::new(db.clone()),
        catalog: CatalogService::new(db.clone()),
        patrons: PatronService::new(db.clone()),
        sweeper: OverdueSweeper::new(db.clone()),
        db,
        _dir: dir,
    }
}

pub async fn add_book(ctx: &TestContext, title: &str, copies: i64) -> Book {
    ctx.catalog
        .create(NewBook {
            title: title.to_string(),
            author: "Test Author".to_string(),
            category: "Fiction".to_string(),
            total_copies: copies,
            ..Default::default()
        })
        .await
        .expect("create book")
}

pub async fn add_patron(ctx: &TestContext, name: &str) -> Patron {
    ctx.patrons
        .create(NewPatron {
            name: name.to_string(),
            email: format!("{}@example.edu", name.to_lowercase()),
            patron_type: "student".to_string(),
            department: None,
        })
        .await
        .expect("create patron")
}

/// Simulate the clock moving past the due date by pushing `due_date` into
/// the past.
pub async fn backdate_due(ctx: &TestContext, loan_id: &str, days: i64) {
    backdate_due_hours(ctx, loan_id, days * 24).await;
}

/// Hour-granular variant: backdating by `n*24 - 1` hours puts a return in
/// the n-th started overdue day.
pub async fn backdate_due_hours(ctx: &TestContext, loan_id: &str, hours: i64) {
    let due = Utc::now() - Duration::hours(hours);
    sqlx::query("UPDATE loans SET due_date = ? WHERE id = ?")
        .bind(due)
        .bind(loan_id)
        .execute(ctx.db.pool())
        .await
        .expect("backdate due date");
}

pub async fn available_copies(ctx: &TestContext, book_id: &str) -> i64 {
    sqlx::query_scalar("SELECT available_copies FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_one(ctx.db.pool())
        .await
        .expect("read available copies")
}

pub async fn loan_status(ctx: &TestContext, loan_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM loans WHERE id = ?")
        .bind(loan_id)
        .fetch_one(ctx.db.pool())
        .await
        .expect("read loan status")
}
