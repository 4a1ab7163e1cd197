use academy_auth::{Claims, Identity};

/// Authenticated caller for a request, decoded from the bearer token.
///
/// Inserted by the credential gate; every handler behind it may extract it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalContext {
    identity: Identity,
}

impl PrincipalContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn from_claims(claims: Claims) -> Self {
        Self::new(claims.identity)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    /// Display name carried in the token payload, if the client sent one.
    pub fn display_name(&self) -> Option<&str> {
        self.identity.extra.get("name").and_then(|v| v.as_str())
    }
}
