//! Database initialization and status

use anyhow::{Context, Result};
use libman_persistence::Database;
use std::path::Path;

fn database_url(db_path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", db_path.display())
}

/// Initialize the database with schema
pub async fn init_database(db_path: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        println!("Removed existing database");
    }

    let db = Database::init(&database_url(db_path))
        .await
        .context("Failed to initialize database")?;
    db.close().await;
    Ok(())
}

/// Connect to an existing database
pub async fn connect(db_path: &Path) -> Result<Database> {
    Database::init(&database_url(db_path))
        .await
        .context("Failed to connect to database. Run 'libman init' first.")
}

/// Show database status
pub async fn show_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("Database not found at {:?}", db_path);
        println!("   Run 'libman init' to create the database");
        return Ok(());
    }

    let db = connect(db_path).await?;
    let pool = db.pool();

    println!("Database Status");
    println!("   Path: {:?}", db_path);
    println!();

    let book_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await
        .unwrap_or((0,));

    let patron_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM patrons")
        .fetch_one(pool)
        .await
        .unwrap_or((0,));

    let loan_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM loans")
        .fetch_one(pool)
        .await
        .unwrap_or((0,));

    let open_count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM loans WHERE status IN ('borrowed', 'overdue')",
    )
    .fetch_one(pool)
    .await
    .unwrap_or((0,));

    println!("   Books:        {}", book_count.0);
    println!("   Patrons:      {}", patron_count.0);
    println!("   Loans:        {}", loan_count.0);
    println!("   Open loans:   {}", open_count.0);

    db.close().await;
    Ok(())
}
