//! Role and self-scope gates.
//!
//! The role gate re-reads the caller's user record on every request, so a
//! promotion takes effect immediately.

use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};

use academy_auth::{AuthzError, Role, require_role, require_same_identity};
use academy_infra::UserStore;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct RoleGate {
    users: Arc<dyn UserStore>,
    role: Role,
}

impl RoleGate {
    pub fn new(users: Arc<dyn UserStore>, role: Role) -> Self {
        Self { users, role }
    }
}

/// Must run behind [`crate::middleware::auth_middleware`].
pub async fn role_middleware(
    State(gate): State<RoleGate>,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned copy: the request body is not `Sync`, so no borrow of `req` may
    // live across the lookup below.
    let email = req
        .extensions()
        .get::<PrincipalContext>()
        .map(|p| p.email().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let user = gate.users.find_by_email(&email).await?;
    require_role(user.as_ref(), &gate.role).map_err(|e| {
        tracing::debug!(email, error = %e, "role gate rejected caller");
        ApiError::from(e)
    })?;

    Ok(next.run(req).await)
}

/// Self-scope check for routes that act on the caller's own records.
pub fn ensure_self(principal: &PrincipalContext, email: &str) -> Result<(), AuthzError> {
    require_same_identity(principal.identity(), email)
}
