//! HS256 bearer tokens.
//!
//! Signature checking is delegated to `jsonwebtoken`; time-window checks go
//! through [`validate_claims`] with an explicit `now` so expiry is testable.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{Claims, Identity, TokenError, validate_claims};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// Signs a fresh token for a client-supplied identity.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, identity: Identity, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Shared-secret token issuer and validator.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(&self, identity: Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::issue(identity, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::Invalid(e.to_string())
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
