//! User records and role promotion.

use serde::{Deserialize, Serialize};

use academy_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// Persisted user record, keyed by email.
///
/// # Invariants
/// - `email` is unique across users (enforced by the store).
/// - `role` is only changed by [`User::promote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: Option<Role>,
}

/// Sign-in payload used to create a user on first login.
///
/// Any client-supplied role is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "photoURL", alias = "photo")]
    pub photo_url: Option<String>,
}

impl User {
    pub fn register(id: UserId, new: NewUser) -> DomainResult<Self> {
        // Validate email format (basic check)
        if new.email.trim().is_empty() || !new.email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            id,
            email: new.email,
            name: new.name,
            photo_url: new.photo_url,
            role: None,
        })
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role.as_ref() == Some(role)
    }

    /// Set the user's role. Returns `false` if the user already had it.
    pub fn promote(&mut self, role: Role) -> bool {
        if self.has_role(&role) {
            return false;
        }
        self.role = Some(role);
        true
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
