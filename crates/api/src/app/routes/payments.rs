use std::sync::Arc;

use axum::{Json, extract::Extension};

use academy_enrollment::{CURRENCY, PaymentIntentRequest, amount_in_cents};

use crate::app::dto::ClientSecretResponse;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;

pub async fn create_payment_intent(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<PaymentIntentRequest>,
) -> Result<Json<ClientSecretResponse>, ApiError> {
    let amount = amount_in_cents(body.price)?;
    let intent = services.payments.create_intent(amount, CURRENCY).await?;
    tracing::info!(intent_id = %intent.id, amount, "payment intent created");
    Ok(Json(ClientSecretResponse {
        client_secret: intent.client_secret,
    }))
}
