//! Overdue sweeper
//!
//! Batch reclassification of stale borrowed entries. The whole sweep is one
//! conditional update keyed on `status = 'borrowed'`, so a return or renew
//! landing mid-sweep can never be clobbered by a stale write.

use chrono::Utc;
use libman_persistence::{Database, LoanRepo};

use crate::error::LendingResult;

/// Flips stale `borrowed` ledger entries to `overdue`.
#[derive(Clone)]
pub struct OverdueSweeper {
    db: Database,
}

impl OverdueSweeper {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run one sweep and report how many entries were flipped.
    pub async fn sweep(&self) -> LendingResult<u64> {
        let updated = LoanRepo::mark_overdue_batch(self.db.pool(), Utc::now()).await?;
        if updated > 0 {
            tracing::info!(updated, "overdue sweep flipped stale loans");
        } else {
            tracing::debug!("overdue sweep found nothing stale");
        }
        Ok(updated)
    }
}
