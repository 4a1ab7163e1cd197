use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier stored on a user record.
///
/// The platform knows two roles, [`Role::ADMIN`] and [`Role::INSTRUCTOR`]; a
/// user without a role is a student. Roles stay opaque strings so that records
/// written by older clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const INSTRUCTOR: Role = Role(Cow::Borrowed("instructor"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
