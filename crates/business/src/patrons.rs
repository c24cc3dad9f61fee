//! Patron management
//!
//! CRUD glue over the patron store. Patrons are never deleted: removal is a
//! soft-deactivate that blocks new borrows while keeping loan history.

use libman_core::{Patron, PatronType, Validator};
use libman_persistence::{Database, PatronFilter, PatronRepo};

use crate::error::{LendingError, LendingResult};

/// Fields accepted when registering a patron.
#[derive(Debug, Clone, Default)]
pub struct NewPatron {
    pub name: String,
    pub email: String,
    pub patron_type: String,
    pub department: Option<String>,
}

/// Partial update for a patron; absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PatronUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub patron_type: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// Patron store management operations.
#[derive(Clone)]
pub struct PatronService {
    db: Database,
}

impl PatronService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewPatron) -> LendingResult<Patron> {
        let type_names: Vec<&str> = PatronType::ALL.iter().map(|t| t.as_str()).collect();

        let mut v = Validator::new();
        v.require_text("name", &new.name)
            .require_email("email", &new.email)
            .require_one_of("userType", &new.patron_type, &type_names);
        v.finish()?;

        let patron_type = PatronType::from_str(&new.patron_type).ok_or_else(|| {
            LendingError::Validation(libman_core::ValidationErrors(vec![format!(
                "userType must be one of: {}",
                type_names.join(", ")
            )]))
        })?;

        let mut patron = Patron::new(new.name, new.email, patron_type);
        patron.department = new.department;

        PatronRepo::insert(self.db.pool(), &patron).await?;
        tracing::info!(user = %patron.id, name = %patron.name, "patron registered");
        Ok(patron)
    }

    pub async fn get(&self, id: &str) -> LendingResult<Patron> {
        let row = PatronRepo::get(self.db.pool(), id).await?;
        Ok(row.try_into()?)
    }

    pub async fn update(&self, id: &str, update: PatronUpdate) -> LendingResult<Patron> {
        let mut patron: Patron = PatronRepo::get(self.db.pool(), id).await?.try_into()?;

        if let Some(name) = update.name {
            patron.name = name;
        }
        if let Some(email) = update.email {
            patron.email = email;
        }
        if let Some(type_str) = &update.patron_type {
            patron.patron_type = PatronType::from_str(type_str).ok_or_else(|| {
                let type_names: Vec<&str> =
                    PatronType::ALL.iter().map(|t| t.as_str()).collect();
                LendingError::Validation(libman_core::ValidationErrors(vec![format!(
                    "userType must be one of: {}",
                    type_names.join(", ")
                )]))
            })?;
        }
        if let Some(department) = update.department {
            patron.department = Some(department);
        }
        if let Some(is_active) = update.is_active {
            patron.is_active = is_active;
        }

        let mut v = Validator::new();
        v.require_text("name", &patron.name)
            .require_email("email", &patron.email);
        v.finish()?;

        PatronRepo::update(self.db.pool(), &patron).await?;
        Ok(patron)
    }

    /// Soft delete: the patron keeps their history but cannot start new
    /// borrows.
    pub async fn deactivate(&self, id: &str) -> LendingResult<()> {
        PatronRepo::set_active(self.db.pool(), id, false).await?;
        tracing::info!(user = %id, "patron deactivated");
        Ok(())
    }

    pub async fn list(&self, filter: &PatronFilter) -> LendingResult<(Vec<Patron>, i64)> {
        let (rows, total) = PatronRepo::list(self.db.pool(), filter).await?;
        let patrons = rows
            .into_iter()
            .map(Patron::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((patrons, total))
    }

    /// The patron types the system accepts.
    pub fn types(&self) -> Vec<&'static str> {
        PatronType::ALL.iter().map(|t| t.as_str()).collect()
    }
}
