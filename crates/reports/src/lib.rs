//! # Libman Reports
//!
//! Read-only analytics over the catalog, patron and ledger stores. Nothing
//! in this crate mutates state; every report is plain grouped SQL shaped
//! for the dashboard client.
//!
//! ## Reports
//!
//! - [`ReportService::dashboard`] - overview counters plus category and
//!   patron-type breakdowns
//! - [`ReportService::most_borrowed`] - title ranking within a period
//! - [`ReportService::patron_type_activity`] - borrowing totals per patron
//!   type
//! - [`ReportService::reading_patterns`] - activity per calendar month
//! - [`ReportService::monthly_report`] - borrows/returns/overdue per month
//!   of one year

pub mod analytics;

pub use analytics::{
    CategoryCount, DashboardReport, MonthlyPattern, MonthlyReportRow, MostBorrowedRow, Overview,
    PatronTypeActivity, PatronTypeCount, Period, ReportService,
};
