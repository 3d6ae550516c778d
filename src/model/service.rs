//! The towing service catalog: flat services priced per pound of vehicle weight.

use crate::error::validation;
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A per-pound price in cents.
///
/// The database stores rates as decimal text while API callers may send either a JSON number or a
/// string, so both forms are kept as received and coerced only when the rate is used. Text is read
/// up to the end of its leading number, so `"5.5¢"` is `5.5`; text with no leading number
/// coerces to `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rate {
    Number(f64),
    Text(String),
}

impl Rate {
    /// Returns the rate in cents per pound.
    pub fn cents_per_lb(&self) -> f64 {
        match self {
            Rate::Number(n) => *n,
            Rate::Text(s) => leading_number(s),
        }
    }

    /// Validates a rate entered by a user and normalizes it to the stored text form.
    ///
    /// Stored rates are `numeric(5,2)`: non-negative, below 1000 and at most two decimals.
    pub fn parse_stored(s: &str) -> Result<String> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|e| validation(format!("Invalid rate '{trimmed}': {e}")))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(validation(format!("Rate cannot be negative: {trimmed}")));
        }
        if value.scale() > 2 && value.normalize().scale() > 2 {
            return Err(validation(format!(
                "Rate may have at most two decimal places: {trimmed}"
            )));
        }
        if value >= Decimal::from(1000) {
            return Err(validation(format!("Rate must be below 1000: {trimmed}")));
        }
        let mut normalized = value.normalize();
        if normalized.scale() == 0 {
            normalized.rescale(1);
        }
        Ok(normalized.to_string())
    }
}

/// The longest leading decimal number of `s`, or `NaN` when it does not start with one.
fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());
    (1..=end)
        .rev()
        .find_map(|i| s[..i].parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

impl Display for Rate {
    /// Displays the rate the way it is printed on an invoice, e.g. `4.0¢/lb`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}¢/lb", self.cents_per_lb())
    }
}

impl From<f64> for Rate {
    fn from(value: f64) -> Self {
        Rate::Number(value)
    }
}

impl From<String> for Rate {
    fn from(value: String) -> Self {
        Rate::Text(value)
    }
}

impl From<&str> for Rate {
    fn from(value: &str) -> Self {
        Rate::Text(value.to_string())
    }
}

/// An entry of the service catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalogEntry {
    pub id: i64,
    pub name: String,
    pub rate: Rate,
}

impl ServiceCatalogEntry {
    pub fn new(id: i64, name: impl Into<String>, rate: impl Into<Rate>) -> Self {
        Self {
            id,
            name: name.into(),
            rate: rate.into(),
        }
    }
}

/// The catalog that a new database is seeded with: `(name, rate in cents per pound)`.
pub const DEFAULT_CATALOG: &[(&str, &str)] = &[
    ("Normal Recovery (On or Near Highway)", "4.0"),
    ("Contained Recovery/Winching", "4.0"),
    ("Salvage/Debris Recovery", "5.5"),
    ("Handle Complete Recovery", "6.0"),
    ("Total Loss Recovery", "5.0"),
    ("Rollover", "4.0"),
    ("Inclement Weather", "2.5"),
    ("Nights/Weekends/Holidays", "2.5"),
    ("Travel Within 50 Miles", "3.5"),
    ("Travel Beyond 50 Miles", "6.5"),
    ("Wheels Higher than Roof", "2.0"),
    ("Embankment or Inclines", "4.5"),
    ("Back Doors Open", "2.0"),
    ("Tractor from Under Trailer", "2.0"),
    ("Major Suspension Damage", "6.0"),
    ("10 MPH Collision Factor", "2.0"),
    ("30 MPH Collision Factor", "3.0"),
    ("50 MPH Collision Factor", "4.0"),
    ("70+ MPH Collision Factor", "5.0"),
];

/// The default catalog with ids assigned in seed order starting at 1.
pub fn default_catalog() -> Vec<ServiceCatalogEntry> {
    DEFAULT_CATALOG
        .iter()
        .enumerate()
        .map(|(ix, (name, rate))| ServiceCatalogEntry::new(ix as i64 + 1, *name, *rate))
        .collect()
}
