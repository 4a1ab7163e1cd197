use thiserror::Error;

use crate::{Identity, Role, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{0}'")]
    MissingRole(Role),

    #[error("forbidden: identity mismatch")]
    IdentityMismatch,
}

/// Role gate over a freshly loaded user record.
///
/// A missing record is treated as "no role".
///
/// - No IO
/// - No panics
pub fn require_role(user: Option<&User>, required: &Role) -> Result<(), AuthzError> {
    match user {
        Some(u) if u.has_role(required) => Ok(()),
        _ => Err(AuthzError::MissingRole(required.clone())),
    }
}

/// Self-scope gate: the caller may only act on their own email.
pub fn require_same_identity(caller: &Identity, requested_email: &str) -> Result<(), AuthzError> {
    if caller.is(requested_email) {
        Ok(())
    } else {
        Err(AuthzError::IdentityMismatch)
    }
}
