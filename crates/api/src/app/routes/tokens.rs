use std::sync::Arc;

use axum::{Json, extract::Extension};
use chrono::Utc;

use academy_auth::{Identity, TokenIssuer};

use crate::app::dto::TokenResponse;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;

/// Sign the client-supplied identity payload for one hour.
pub async fn issue_token(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(identity): JsonBody<Identity>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = services.tokens.issue(identity, Utc::now())?;
    Ok(Json(TokenResponse { token }))
}
