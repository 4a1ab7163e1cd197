use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registered JWT claim names that the token layer owns.
const RESERVED_CLAIMS: [&str; 3] = ["iat", "exp", "nbf"];

/// Identity of an authenticated caller.
///
/// Clients sign in with a free-form identity payload; `email` is the only
/// field the server relies on. Everything else is carried through the token
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }

    /// Drop client-supplied fields that would collide with token timestamps.
    pub fn without_reserved_claims(mut self) -> Self {
        for key in RESERVED_CLAIMS {
            self.extra.remove(key);
        }
        self
    }

    /// Whether this identity owns the given email (exact match).
    pub fn is(&self, email: &str) -> bool {
        self.email == email
    }
}
