//! Outbound payment processor port.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod stripe;

pub use stripe::StripeGateway;

/// A freshly created payment intent. Only the client secret is returned to
/// the browser, which confirms the card payment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payments are not configured")]
    NotConfigured,

    #[error("payment processor rejected the request: {0}")]
    Rejected(String),

    #[error("payment processor unreachable: {0}")]
    Transport(String),

    #[error("unexpected payment processor response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a card-only intent for `amount_cents` in `currency`.
    async fn create_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent, PaymentError>;
}

/// Gateway used when no processor key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_intent(&self, _amount_cents: i64, _currency: &str) -> Result<PaymentIntent, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}
