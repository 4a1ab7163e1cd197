use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
};
use chrono::Utc;

use academy_catalog::{ClassChange, ClassDraft, ClassOffering, ClassPatch};
use academy_core::{ClassId, InsertAck, UpdateAck};

use crate::app::dto::FeedbackRequest;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::authz::ensure_self;
use crate::context::PrincipalContext;

pub async fn list_classes(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ClassOffering>>, ApiError> {
    Ok(Json(services.stores.classes.list().await?))
}

/// A missing class answers `null`.
pub async fn get_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Option<ClassOffering>>, ApiError> {
    let id: ClassId = id.parse()?;
    Ok(Json(services.stores.classes.get(id).await?))
}

/// The instructor email always comes from the token, and new classes always
/// start out pending.
pub async fn create_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(mut draft): JsonBody<ClassDraft>,
) -> Result<Json<InsertAck>, ApiError> {
    if draft.instructor_name.is_none() {
        draft.instructor_name = principal.display_name().map(str::to_string);
    }

    let class = ClassOffering::create(ClassId::new(), draft, principal.email(), Utc::now())?;
    let ack = services.stores.classes.insert(class).await?;
    tracing::info!(class_id = %ack.inserted_id, instructor = principal.email(), "class created");
    Ok(Json(ack))
}

pub async fn my_classes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(email): Path<String>,
) -> Result<Json<Vec<ClassOffering>>, ApiError> {
    ensure_self(&principal, &email)?;
    Ok(Json(services.stores.classes.list_by_instructor(&email).await?))
}

/// Approver edit. The status is taken verbatim.
pub async fn review_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ClassPatch>,
) -> Result<Json<UpdateAck>, ApiError> {
    let id: ClassId = id.parse()?;
    update(&services, id, ClassChange::Review(patch)).await
}

/// Owner edit. Any change sends the class back to review.
pub async fn revise_my_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ClassPatch>,
) -> Result<Json<UpdateAck>, ApiError> {
    let id: ClassId = id.parse()?;

    let Some(class) = services.stores.classes.get(id).await? else {
        return Ok(Json(UpdateAck::unmatched()));
    };
    if !class.is_owned_by(principal.email()) {
        tracing::debug!(class_id = %id, caller = principal.email(), "revise rejected: not the owner");
        return Err(ApiError::Forbidden);
    }

    update(&services, id, ClassChange::Revise(patch)).await
}

pub async fn send_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<FeedbackRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let id: ClassId = id.parse()?;
    update(&services, id, ClassChange::Feedback(body.feedback)).await
}

async fn update(services: &AppServices, id: ClassId, change: ClassChange) -> Result<Json<UpdateAck>, ApiError> {
    change.validate()?;
    Ok(Json(services.stores.classes.update(id, &change).await?))
}
