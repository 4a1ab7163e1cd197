use std::sync::Arc;

use axum::{Json, extract::Extension};

use academy_catalog::{InstructorProfile, rank_by_popularity};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn popular_instructors(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<InstructorProfile>>, ApiError> {
    let profiles = services.stores.instructors.list().await?;
    Ok(Json(rank_by_popularity(profiles)))
}
