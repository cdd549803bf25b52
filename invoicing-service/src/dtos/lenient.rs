//! Forgiving number parsing for client-submitted amounts.
//!
//! Clients send amounts as JSON numbers, numeric strings or scientific
//! notation. Line item fields fall back to zero when a value is missing or
//! unparseable; invoice totals must parse. Serial numbers are display-only
//! and are dropped rather than rejected when they are not whole numbers.

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

fn parse(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn coerce(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse(&n.to_string()),
        Value::String(s) => parse(s),
        _ => None,
    }
}

/// Missing, `null` and non-numeric values become zero.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce).unwrap_or(Decimal::ZERO))
}

/// Like [`decimal`] but rejects values that are not numbers.
pub fn required_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

/// Whole non-negative numbers, as a JSON number or a numeric string.
/// Anything else becomes `None`.
pub fn serial<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Amounts {
        #[serde(default, deserialize_with = "decimal")]
        lenient: Decimal,
        #[serde(deserialize_with = "required_decimal")]
        strict: Decimal,
    }

    fn amounts(json: &str) -> Result<Amounts, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let parsed = amounts(r#"{"lenient": "12.50", "strict": 0.1}"#).unwrap();
        assert_eq!(parsed.lenient, Decimal::new(1250, 2));
        assert_eq!(parsed.strict, Decimal::new(1, 1));

        let parsed = amounts(r#"{"lenient": " 3 ", "strict": "1e2"}"#).unwrap();
        assert_eq!(parsed.lenient, Decimal::from(3));
        assert_eq!(parsed.strict, Decimal::from(100));
    }

    #[test]
    fn lenient_values_fall_back_to_zero() {
        for json in [
            r#"{"strict": 1}"#,
            r#"{"lenient": null, "strict": 1}"#,
            r#"{"lenient": "abc", "strict": 1}"#,
            r#"{"lenient": true, "strict": 1}"#,
            r#"{"lenient": "", "strict": 1}"#,
        ] {
            assert_eq!(amounts(json).unwrap().lenient, Decimal::ZERO, "{}", json);
        }
    }

    #[test]
    fn required_values_must_be_numeric() {
        assert!(amounts(r#"{"lenient": 1}"#).is_err());
        assert!(amounts(r#"{"strict": null}"#).is_err());
        assert!(amounts(r#"{"strict": "twelve"}"#).is_err());
        assert!(amounts(r#"{"strict": [1]}"#).is_err());
    }

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "serial")]
        sr_no: Option<u32>,
    }

    fn sr_no(json: &str) -> Option<u32> {
        serde_json::from_str::<Row>(json).unwrap().sr_no
    }

    #[test]
    fn serial_numbers_accept_digits_in_strings() {
        assert_eq!(sr_no(r#"{"sr_no": 1}"#), Some(1));
        assert_eq!(sr_no(r#"{"sr_no": "1"}"#), Some(1));
        assert_eq!(sr_no(r#"{"sr_no": " 12 "}"#), Some(12));
    }

    #[test]
    fn malformed_serial_numbers_are_dropped() {
        for json in [
            r#"{}"#,
            r#"{"sr_no": null}"#,
            r#"{"sr_no": "one"}"#,
            r#"{"sr_no": -1}"#,
            r#"{"sr_no": 1.5}"#,
            r#"{"sr_no": 5000000000}"#,
        ] {
            assert_eq!(sr_no(json), None, "{}", json);
        }
    }
}
