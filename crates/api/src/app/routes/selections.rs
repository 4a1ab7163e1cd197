use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};

use academy_core::{DeleteAck, DomainError, InsertAck, SelectionId};
use academy_enrollment::{NewSelection, SelectedCourse};

use crate::app::dto::EmailQuery;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::authz::ensure_self;
use crate::context::PrincipalContext;

/// Add a class to the caller's cart. Class fields are copied into the entry.
pub async fn select_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewSelection>,
) -> Result<Json<InsertAck>, ApiError> {
    ensure_self(&principal, &body.email)?;

    let class = services
        .stores
        .classes
        .get(body.class_id)
        .await?
        .ok_or(DomainError::not_found("class"))?;

    let selection = SelectedCourse::select(SelectionId::new(), body.email, &class);
    Ok(Json(services.stores.selections.insert(selection).await?))
}

/// No `email` answers `[]`; someone else's email is forbidden.
pub async fn list_selected(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<SelectedCourse>>, ApiError> {
    let Some(email) = query.into_email() else {
        return Ok(Json(Vec::new()));
    };
    ensure_self(&principal, &email)?;
    Ok(Json(services.stores.selections.list_by_email(&email).await?))
}

pub async fn get_selected(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<Option<SelectedCourse>>, ApiError> {
    let id: SelectionId = id.parse()?;
    let selection = services.stores.selections.get(id).await?;
    if let Some(selection) = &selection {
        ensure_self(&principal, &selection.email)?;
    }
    Ok(Json(selection))
}

pub async fn remove_selected(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    let id: SelectionId = id.parse()?;
    let Some(selection) = services.stores.selections.get(id).await? else {
        return Ok(Json(DeleteAck::new(false)));
    };
    ensure_self(&principal, &selection.email)?;
    Ok(Json(services.stores.selections.delete(id).await?))
}
