use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Identity;

/// Lifetime of every issued token. There is no refresh mechanism.
pub const TOKEN_TTL: TimeDelta = TimeDelta::hours(1);

/// JWT claims model (transport-agnostic).
///
/// The caller identity is flattened into the top-level claim set next to the
/// registered `iat`/`exp` timestamps (seconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Identity,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Claims for a token issued at `now` and valid for [`TOKEN_TTL`].
    pub fn issue(identity: Identity, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            identity: identity.without_reserved_claims(),
            iat,
            exp: iat + TOKEN_TTL.num_seconds(),
        }
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Deterministically validate token timestamps against `now`.
///
/// A token is valid while `iat <= now < exp`. No leeway is applied.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
