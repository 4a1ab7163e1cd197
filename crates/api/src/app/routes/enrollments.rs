use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use chrono::Utc;

use academy_core::{ClassId, EnrollmentId};
use academy_enrollment::{Enrollment, EnrollmentReceipt, PaymentRecord};

use crate::app::dto::EmailQuery;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::authz::ensure_self;
use crate::context::PrincipalContext;

/// Turn a paid selection into an enrollment for class `id`.
///
/// The store performs insert, selection delete and seat decrement as one
/// atomic step; a missing selection or class writes nothing.
pub async fn enroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(payment): JsonBody<PaymentRecord>,
) -> Result<Json<EnrollmentReceipt>, ApiError> {
    let class_id: ClassId = id.parse()?;
    ensure_self(&principal, &payment.email)?;

    let enrollment = Enrollment::record(EnrollmentId::new(), class_id, payment, Utc::now())?;
    let selection_id = enrollment.selection_id;
    let receipt = services.stores.enrollments.enroll(enrollment).await?;

    tracing::info!(
        %class_id,
        %selection_id,
        enrollment_id = %receipt.insert_result.inserted_id,
        "enrollment committed"
    );
    Ok(Json(receipt))
}

/// Newest first. No `email` answers `[]`; someone else's email is forbidden.
pub async fn list_enrolled(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    let Some(email) = query.into_email() else {
        return Ok(Json(Vec::new()));
    };
    ensure_self(&principal, &email)?;
    Ok(Json(services.stores.enrollments.list_by_email(&email).await?))
}
