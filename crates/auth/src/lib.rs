//! `academy-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it issues and
//! verifies bearer tokens, models roles, and makes role/identity decisions over
//! records that the caller has already loaded.

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, require_role, require_same_identity};
pub use claims::{Claims, TOKEN_TTL, TokenError, validate_claims};
pub use principal::Identity;
pub use roles::Role;
pub use token::{Hs256Jwt, JwtValidator, TokenIssuer};
pub use user::{NewUser, User};
