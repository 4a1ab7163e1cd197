use serde::{Deserialize, Serialize};

// -------------------------
// Request DTOs
// -------------------------

/// `?email=` filter of the self-scoped list routes.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    /// The requested email; `?email=` with no value counts as absent.
    pub fn into_email(self) -> Option<String> {
        self.email.filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize)]
pub struct InstructorStatus {
    pub instructor: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretResponse {
    pub client_secret: String,
}
