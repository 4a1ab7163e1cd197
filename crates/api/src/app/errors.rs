use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use academy_auth::{AuthzError, TokenError};
use academy_core::DomainError;
use academy_enrollment::EnrollmentRejection;
use academy_infra::{EnrollError, PaymentError, StoreError};

pub const UNAUTHORIZED_MESSAGE: &str = "Your access unauthorized";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden access";

/// Every failure a handler or gate can report.
///
/// All variants render as `{ "error": true, "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Store(StoreError),
    Payment(PaymentError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE),
            ApiError::Forbidden => json_error(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, msg),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store operation failed")
            }
            ApiError::Payment(PaymentError::NotConfigured) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, PaymentError::NotConfigured.to_string())
            }
            ApiError::Payment(e) => {
                tracing::error!(error = %e, "payment processor call failed");
                json_error(StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ApiError::BadRequest(err.to_string()),
            DomainError::NotFound(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::Forbidden
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<EnrollError> for ApiError {
    fn from(err: EnrollError) -> Self {
        match err {
            EnrollError::Rejected(
                rejection @ (EnrollmentRejection::SelectionNotFound(_) | EnrollmentRejection::ClassNotFound(_)),
            ) => ApiError::NotFound(rejection.to_string()),
            EnrollError::Rejected(rejection @ EnrollmentRejection::SelectionMismatch(_)) => {
                ApiError::Conflict(rejection.to_string())
            }
            EnrollError::Store(e) => ApiError::Store(e),
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": true,
            "message": message.into(),
        })),
    )
        .into_response()
}
