//! Lenient numeric coercion for client-supplied documents.
//!
//! Web forms post prices and seat counts either as JSON numbers or as decimal
//! strings (`"25.50"`, `"10"`). Both are accepted and normalized here so that
//! stored documents always carry real numbers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Coerce a JSON number or decimal string into a finite `f64`.
pub fn coerce_f64(value: &Value, field: &str) -> DomainResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(DomainError::validation(format!("{field} must be a number"))),
    }
}

/// Coerce a JSON number or decimal string into a whole seat count.
///
/// Negative counts are accepted: seat capacity has no floor.
pub fn coerce_seats(value: &Value, field: &str) -> DomainResult<i64> {
    let v = coerce_f64(value, field)?;
    // i64::MAX is not representable; as f64 it rounds up to 2^63.
    if v.fract() != 0.0 || v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return Err(DomainError::validation(format!("{field} must be a whole number")));
    }
    Ok(v as i64)
}

/// `deserialize_with` adapters built on the coercion functions.
///
/// Serde does not tell an adapter which field it is decoding, so each adapter
/// is named after the one field it serves and reports errors under that name.
pub mod lenient {
    use super::*;

    const PRICE: &str = "price";
    const SEATS: &str = "availableSeats";

    pub fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        coerce_f64(&value, PRICE).map_err(serde::de::Error::custom)
    }

    pub fn seats<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        coerce_seats(&value, SEATS).map_err(serde::de::Error::custom)
    }

    /// Like [`price`], but `null` and absent fields become `None`.
    /// Pair with `#[serde(default)]`.
    pub fn option_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => coerce_f64(&value, PRICE)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }

    /// Like [`seats`], but `null` and absent fields become `None`.
    /// Pair with `#[serde(default)]`.
    pub fn option_seats<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => coerce_seats(&value, SEATS)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn decimal_strings_become_numbers() {
        assert_eq!(coerce_f64(&json!("25.50"), "price").unwrap(), 25.5);
        assert_eq!(coerce_f64(&json!(" 12 "), "price").unwrap(), 12.0);
        assert_eq!(coerce_seats(&json!("10"), "availableSeats").unwrap(), 10);
    }

    #[test]
    fn json_numbers_pass_through() {
        assert_eq!(coerce_f64(&json!(19.99), "price").unwrap(), 19.99);
        assert_eq!(coerce_seats(&json!(-2), "availableSeats").unwrap(), -2);
        assert_eq!(coerce_seats(&json!(7.0), "availableSeats").unwrap(), 7);
    }

    #[test]
    fn rejects_non_numeric_input() {
        for bad in [json!("abc"), json!(""), json!(null), json!(true), json!([1])] {
            let err = coerce_f64(&bad, "price").unwrap_err();
            assert_eq!(err, DomainError::validation("price must be a number"));
        }
        assert!(coerce_f64(&json!("NaN"), "price").is_err());
        assert!(coerce_f64(&json!("inf"), "price").is_err());
    }

    #[test]
    fn rejects_fractional_seats() {
        assert!(coerce_seats(&json!("10.5"), "availableSeats").is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(deserialize_with = "lenient::price")]
        price: f64,
        #[serde(default, rename = "availableSeats", deserialize_with = "lenient::option_seats")]
        seats: Option<i64>,
    }

    #[test]
    fn serde_adapters_accept_both_shapes() {
        let form: Form = serde_json::from_value(json!({ "price": "8.25", "availableSeats": 3 })).unwrap();
        assert_eq!(form.price, 8.25);
        assert_eq!(form.seats, Some(3));

        let form: Form = serde_json::from_value(json!({ "price": 8 })).unwrap();
        assert_eq!(form.seats, None);

        assert!(serde_json::from_value::<Form>(json!({ "price": "free" })).is_err());
    }

    #[test]
    fn adapter_errors_name_the_field() {
        let err = serde_json::from_value::<Form>(json!({ "price": "free" })).unwrap_err();
        assert!(err.to_string().contains("price must be a number"), "{err}");

        let err = serde_json::from_value::<Form>(json!({ "price": 1, "availableSeats": "many" })).unwrap_err();
        assert!(err.to_string().contains("availableSeats must be a number"), "{err}");
    }

    #[test]
    fn seats_beyond_i64_are_rejected() {
        assert!(coerce_seats(&json!("9223372036854775808"), "availableSeats").is_err());
        assert!(coerce_seats(&json!(9.3e18), "availableSeats").is_err());
        assert_eq!(
            coerce_seats(&json!("9007199254740992"), "availableSeats").unwrap(),
            9_007_199_254_740_992
        );
    }

    proptest! {
        #[test]
        fn any_integer_string_coerces_to_seats(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(coerce_seats(&json!(n.to_string()), "s").unwrap(), n);
        }

        #[test]
        fn finite_floats_survive_string_round_trip(v in -1.0e9f64..1.0e9) {
            prop_assert_eq!(coerce_f64(&json!(v.to_string()), "p").unwrap(), v);
        }
    }
}
