//! Reqwest-backed Stripe adapter.
//!
//! Only the `POST /v1/payment_intents` call is used. The secret key never
//! leaves this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::{PaymentError, PaymentGateway, PaymentIntent};

const DEFAULT_ENDPOINT: &str = "https://api.stripe.com/v1/payment_intents";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub struct StripeGateway {
    client: Client,
    endpoint: Url,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Result<Self, PaymentError> {
        let endpoint = Url::parse(DEFAULT_ENDPOINT).map_err(|e| PaymentError::Transport(e.to_string()))?;
        Self::with_endpoint(secret_key, endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_endpoint(
        secret_key: impl Into<String>,
        endpoint: Url,
        timeout: Duration,
    ) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(map_transport_error)?;
        Ok(Self {
            client,
            endpoint,
            secret_key: secret_key.into(),
        })
    }
}

impl core::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self), err)]
    async fn create_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.secret_key)
            .form(&intent_form(amount_cents, currency))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_intent(body.as_ref())
    }
}

fn intent_form(amount_cents: i64, currency: &str) -> [(&'static str, String); 3] {
    [
        ("amount", amount_cents.to_string()),
        ("currency", currency.to_string()),
        ("payment_method_types[]", "card".to_string()),
    ]
}

#[derive(Deserialize)]
struct IntentDto {
    id: String,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelopeDto {
    error: ErrorDto,
}

#[derive(Deserialize)]
struct ErrorDto {
    message: Option<String>,
}

fn parse_intent(body: &[u8]) -> Result<PaymentIntent, PaymentError> {
    let dto: IntentDto = serde_json::from_slice(body)
        .map_err(|e| PaymentError::Decode(format!("invalid payment intent JSON: {e}")))?;
    let client_secret = dto
        .client_secret
        .ok_or_else(|| PaymentError::Decode(format!("payment intent {} has no client secret", dto.id)))?;
    Ok(PaymentIntent {
        id: dto.id,
        client_secret,
    })
}

fn map_transport_error(error: reqwest::Error) -> PaymentError {
    PaymentError::Transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentError {
    let message = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("status {}", status.as_u16()));

    if status.is_client_error() {
        PaymentError::Rejected(message)
    } else {
        PaymentError::Transport(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_requests_card_only_intents() {
        let form = intent_form(2550, "usd");
        assert_eq!(form[0], ("amount", "2550".to_string()));
        assert_eq!(form[1], ("currency", "usd".to_string()));
        assert_eq!(form[2], ("payment_method_types[]", "card".to_string()));
    }

    #[test]
    fn parses_client_secret() {
        let body = br#"{"id":"pi_123","object":"payment_intent","client_secret":"pi_123_secret_abc"}"#;
        let intent = parse_intent(body).unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_abc");
    }

    #[test]
    fn missing_client_secret_is_a_decode_error() {
        let err = parse_intent(br#"{"id":"pi_123"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Decode(_)));
    }

    #[test]
    fn client_errors_surface_processor_message() {
        let err = map_status_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":{"message":"Amount must be at least 50 cents","type":"invalid_request_error"}}"#,
        );
        assert_eq!(err, PaymentError::Rejected("Amount must be at least 50 cents".to_string()));
    }

    #[test]
    fn server_errors_are_transport_failures() {
        let err = map_status_error(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(err, PaymentError::Transport("status 502".to_string()));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let gateway = StripeGateway::new("sk_test_hidden").unwrap();
        assert!(!format!("{gateway:?}").contains("sk_test_hidden"));
    }
}
