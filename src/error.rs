use serde::Serialize;
use thiserror::Error;

/// One failed constraint on one field. An operation reports every violation
/// it found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("validation failed on {}", .violations.iter().map(|v| v.field.as_str()).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

/// Generic credential failure. Does not say which part of the credentials
/// was wrong.
#[derive(Debug, Clone, Error)]
#[error("invalid credentials")]
pub struct AuthenticationError;
