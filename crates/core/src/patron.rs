//! # Patron Module
//!
//! A library member. Patrons are soft-deactivated via `is_active` so that
//! their loan history survives; an inactive patron cannot start new borrows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Membership category of a patron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatronType {
    Student,
    Faculty,
    Staff,
    Public,
}

impl PatronType {
    /// All known types, in display order.
    pub const ALL: [PatronType; 4] = [
        PatronType::Student,
        PatronType::Faculty,
        PatronType::Staff,
        PatronType::Public,
    ];

    /// Code string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatronType::Student => "student",
            PatronType::Faculty => "faculty",
            PatronType::Staff => "staff",
            PatronType::Public => "public",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(PatronType::Student),
            "faculty" => Some(PatronType::Faculty),
            "staff" => Some(PatronType::Staff),
            "public" => Some(PatronType::Public),
            _ => None,
        }
    }
}

impl fmt::Display for PatronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A library member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patron {
    /// Stable external identifier (uuid v4)
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub patron_type: PatronType,
    pub department: Option<String>,
    /// Soft-delete flag; history is kept when this goes false
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Patron {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        patron_type: PatronType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            patron_type,
            department: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Convenience constructor used heavily in tests.
    pub fn student(name: &str, email: &str) -> Self {
        Self::new(name, email, PatronType::Student)
    }

    pub fn faculty(name: &str, email: &str) -> Self {
        Self::new(name, email, PatronType::Faculty)
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl fmt::Display for Patron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> ({})", self.name, self.email, self.patron_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patron_type_str() {
        assert_eq!(PatronType::Student.as_str(), "student");
        assert_eq!(PatronType::Public.as_str(), "public");
        assert_eq!(PatronType::from_str("FACULTY"), Some(PatronType::Faculty));
        assert_eq!(PatronType::from_str("unknown"), None);
    }

    #[test]
    fn test_patron_creation() {
        let alice = Patron::student("Alice", "alice@example.edu");
        assert_eq!(alice.patron_type, PatronType::Student);
        assert!(alice.is_active);
        assert!(alice.department.is_none());
    }

    #[test]
    fn test_patron_with_department() {
        let bob = Patron::faculty("Bob", "bob@example.edu").with_department("Physics");
        assert_eq!(bob.department.as_deref(), Some("Physics"));
    }

    #[test]
    fn test_deactivate() {
        let mut alice = Patron::student("Alice", "alice@example.edu");
        alice.deactivate();
        assert!(!alice.is_active);
    }

    #[test]
    fn test_display() {
        let alice = Patron::student("Alice", "alice@example.edu");
        assert_eq!(format!("{}", alice), "Alice <alice@example.edu> (student)");
    }
}
