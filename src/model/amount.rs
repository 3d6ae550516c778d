//! Amount type for dollar values on an invoice.
//!
//! Invoice arithmetic is done in floating point, so `Amount` wraps an `f64`. Parsing accepts
//! values that may or may not include a dollar sign and thousands separators, and display always
//! produces the invoice format, e.g. `$1,234.50`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a dollar amount.
///
/// # Examples
///
/// ```
/// # use towbill::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,250.5").unwrap();
/// assert_eq!(amount.value(), 1250.5);
/// assert_eq!(amount.to_string(), "$1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the underlying dollar value.
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }
}

/// An error that can occur when parsing a string into an `Amount`.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        // Accept "-$50.00", "$50.00", "-50.00" and "50.00"
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else {
            trimmed.strip_prefix('$').unwrap_or(trimmed).to_string()
        };
        let without_commas = without_dollar.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value.to_f64().unwrap_or_default()))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.0.is_finite() {
            return write!(f, "${}", self.0);
        }
        // Round first so that -0.001 does not print as "-$0.00"
        let rounded = (self.0 * 100.0).round() / 100.0;
        let sign = if rounded < 0.0 { "-" } else { "" };
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", rounded.abs())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Amount(n)),
            Raw::Text(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Formats a whole number with thousands separators, e.g. `10,000`.
pub fn format_count(n: i64) -> String {
    format_num::format_num!(",d", n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_dollar_sign() {
        let amount = Amount::from_str("$50.00").unwrap();
        assert_eq!(amount.value(), 50.0);
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$50.25").unwrap();
        assert!((amount.value() + 50.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_commas() {
        let amount = Amount::from_str("$1,234,567.89").unwrap();
        assert!((amount.value() - 1234567.89).abs() < 1e-6);
    }

    #[test]
    fn test_parse_empty_is_zero() {
        assert!(Amount::from_str("  ").unwrap().is_zero());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(Amount::from_str("fifty").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(460.0).to_string(), "$460.00");
        assert_eq!(Amount::new(677.5).to_string(), "$677.50");
        assert_eq!(Amount::new(12345.678).to_string(), "$12,345.68");
        assert_eq!(Amount::new(-50.0).to_string(), "-$50.00");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
        assert_eq!(Amount::new(-0.001).to_string(), "$0.00");
    }

    #[test]
    fn test_serde_accepts_number_and_text() {
        let a: Amount = serde_json::from_str("50").unwrap();
        let b: Amount = serde_json::from_str("\"$50.00\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "50.0");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(10000), "10,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-5000), "-5,000");
    }
}
