use serde::Deserialize;

use academy_core::numeric::lenient;
use academy_core::{DomainError, DomainResult};

/// All payment intents are charged in US dollars.
pub const CURRENCY: &str = "usd";

/// Body of a payment intent request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(deserialize_with = "lenient::price")]
    pub price: f64,
}

/// Convert a dollar price to integer cents, rounding to the nearest cent.
pub fn amount_in_cents(price: f64) -> DomainResult<i64> {
    let cents = (price * 100.0).round();
    if !cents.is_finite() || cents <= 0.0 || cents > i64::MAX as f64 {
        return Err(DomainError::validation("price must be a positive amount"));
    }
    Ok(cents as i64)
}
