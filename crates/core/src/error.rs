//! Errors raised by academy documents before anything is persisted.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Client-caused failures: bad field values, unparseable ids, or a referenced
/// document that does not exist. Store and transport failures have their own
/// error types in the infra crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field value was rejected (empty name, non-numeric price, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A path or body id is not a UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The named document is missing.
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }
}
