//! # Libman Business
//!
//! Business logic layer: the lending workflow engine (borrow / return /
//! renew), the overdue sweeper, and the catalog/patron management glue.
//!
//! Every lending operation is one atomic unit against the catalog, patron
//! and ledger stores; failures surface as typed [`LendingError`] values so
//! the API boundary can map each one to a response.

pub mod catalog;
pub mod error;
pub mod lending;
pub mod patrons;
pub mod sweeper;

pub use catalog::{BookUpdate, CatalogService, NewBook};
pub use error::{LendingError, LendingResult};
pub use lending::LendingService;
pub use patrons::{NewPatron, PatronService, PatronUpdate};
pub use sweeper::OverdueSweeper;
