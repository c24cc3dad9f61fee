//! # Validation Module
//!
//! Field validation that runs as an explicit pass before any mutation and
//! collects every violation instead of failing on the first one.

use thiserror::Error;

/// All constraint violations found by a [`Validator`] pass.
#[derive(Debug, Clone, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

/// Collects field violations across a request, then yields either `Ok(())`
/// or the full violation list.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation unless `condition` holds.
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(message.into());
        }
        self
    }

    /// `field` must be present and non-blank.
    pub fn require_text(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            !value.trim().is_empty(),
            format!("{} is required", field),
        )
    }

    /// `field` must be strictly positive.
    pub fn require_positive(&mut self, field: &str, value: i64) -> &mut Self {
        self.check(value > 0, format!("{} must be a positive integer", field))
    }

    /// `field` must be zero or more.
    pub fn require_non_negative(&mut self, field: &str, value: i64) -> &mut Self {
        self.check(value >= 0, format!("{} must not be negative", field))
    }

    /// When present, `field` must fall in `min..=max`.
    pub fn check_range(
        &mut self,
        field: &str,
        value: Option<i64>,
        min: i64,
        max: i64,
    ) -> &mut Self {
        if let Some(v) = value {
            self.check(
                (min..=max).contains(&v),
                format!("{} must be between {} and {}", field, min, max),
            );
        }
        self
    }

    /// `field` must look like an email address.
    pub fn require_email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            is_valid_email(value),
            format!("{} must be a valid email address", field),
        )
    }

    /// `field` must be one of `allowed`.
    pub fn require_one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        self.check(
            allowed.contains(&value.to_lowercase().as_str()),
            format!("{} must be one of: {}", field, allowed.join(", ")),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish the pass: `Err` carries every violation found.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Minimal structural email check: non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() {
        return false;
    }

    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let domain = &domain[1..];

        !local.is_empty()
            && !domain.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    } else {
        false
    }
}
