use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::{IntoResponse, Response},
};

use academy_auth::{NewUser, Role, User};
use academy_core::{UpdateAck, UserId};

use crate::app::dto::{AdminStatus, InstructorStatus, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// First sign-in registers the user; later sign-ins are a no-op.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<NewUser>,
) -> Result<Response, ApiError> {
    let user = User::register(UserId::new(), body)?;
    match services.stores.users.insert_if_absent(user).await? {
        Some(ack) => Ok(Json(ack).into_response()),
        None => Ok(Json(MessageResponse {
            message: "user already exists",
        })
        .into_response()),
    }
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(services.stores.users.list().await?))
}

/// Users holding the instructor role.
pub async fn list_instructors(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(services.stores.users.list_by_role(&Role::INSTRUCTOR).await?))
}

pub async fn make_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    promote(&services, &id, Role::ADMIN).await
}

pub async fn make_instructor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    promote(&services, &id, Role::INSTRUCTOR).await
}

async fn promote(services: &AppServices, id: &str, role: Role) -> Result<Json<UpdateAck>, ApiError> {
    let id: UserId = id.parse()?;
    let ack = services.stores.users.promote(id, role.clone()).await?;
    tracing::info!(user_id = %id, role = %role, matched = ack.matched_count, "role promotion");
    Ok(Json(ack))
}

/// Asking about someone else's role always answers `false`.
pub async fn is_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, ApiError> {
    let admin = holds_role(&services, &principal, &email, &Role::ADMIN).await?;
    Ok(Json(AdminStatus { admin }))
}

pub async fn is_instructor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(email): Path<String>,
) -> Result<Json<InstructorStatus>, ApiError> {
    let instructor = holds_role(&services, &principal, &email, &Role::INSTRUCTOR).await?;
    Ok(Json(InstructorStatus { instructor }))
}

async fn holds_role(
    services: &AppServices,
    principal: &PrincipalContext,
    email: &str,
    role: &Role,
) -> Result<bool, ApiError> {
    if !principal.identity().is(email) {
        return Ok(false);
    }
    let user = services.stores.users.find_by_email(email).await?;
    Ok(user.is_some_and(|u| u.has_role(role)))
}
