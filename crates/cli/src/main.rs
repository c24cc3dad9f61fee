//! Libman CLI - admin operations from the command line
//!
//! Usage:
//! ```bash
//! libman init
//! libman seed
//! libman sweep
//! libman status
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod db;
mod seed;

use libman_business::OverdueSweeper;

/// Libman - library management backend admin tool
#[derive(Parser)]
#[command(name = "libman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/libman.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Load a small sample catalog and patron set
    Seed,

    /// Run the overdue sweep once
    Sweep,

    /// Show database status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure the data directory exists
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&cli.db, force).await?;
            println!("Database initialized at {:?}", cli.db);
        }

        Commands::Seed => {
            let database = db::connect(&cli.db).await?;
            seed::run(&database).await?;
        }

        Commands::Sweep => {
            let database = db::connect(&cli.db).await?;
            let updated = OverdueSweeper::new(database).sweep().await?;
            println!("Overdue sweep complete: {} entries updated", updated);
        }

        Commands::Status => {
            db::show_status(&cli.db).await?;
        }
    }

    Ok(())
}
