//! Application state

use libman_business::{CatalogService, LendingService, OverdueSweeper, PatronService};
use libman_persistence::Database;
use libman_reports::ReportService;

/// Shared application state: one handle per service, all over the same
/// database pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub lending: LendingService,
    pub catalog: CatalogService,
    pub patrons: PatronService,
    pub sweeper: OverdueSweeper,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            lending: LendingService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            patrons: PatronService::new(db.clone()),
            sweeper: OverdueSweeper::new(db.clone()),
            reports: ReportService::new(db.clone()),
            db,
        }
    }
}
