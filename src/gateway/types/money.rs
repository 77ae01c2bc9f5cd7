//! Points amounts at the API boundary
//!
//! - `PointsInput`: format-checked amount from a request body
//! - response DTOs render `Decimal` as a JSON number via
//!   `rust_decimal::serde::float`

use rust_decimal::prelude::*;
use serde::Deserialize;
use serde::de::{self, Visitor};
use std::fmt;

// ============================================================================
// PointsInput: Format-Validated Decimal at Serde Layer
// ============================================================================

/// Points amount from a request body.
///
/// Accepts a JSON number (`200`, `200.5`) or a decimal string (`"200.5"`).
/// Strings are format-checked:
/// - Rejects `.5` (must be `0.5`)
/// - Rejects `5.` (must be `5.0` or `5`)
/// - Rejects empty strings, `+` prefix and scientific notation
///
/// Sign is not checked here; the withdrawal guard rejects non-positive
/// amounts as a business outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsInput(Decimal);

impl PointsInput {
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl std::ops::Deref for PointsInput {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse_strict(s: &str) -> Result<Decimal, String> {
    if s.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }
    if s.starts_with('.') || s.starts_with("-.") {
        return Err("Invalid format: use 0.5 not .5".to_string());
    }
    if s.ends_with('.') {
        return Err("Invalid format: use 5.0 not 5.".to_string());
    }
    if s.contains('e') || s.contains('E') {
        return Err("Invalid format: scientific notation not allowed".to_string());
    }
    if s.starts_with('+') {
        return Err("Invalid format: + prefix not allowed".to_string());
    }
    Decimal::from_str(s).map_err(|e| format!("Invalid decimal: {}", e))
}

struct PointsVisitor;

impl Visitor<'_> for PointsVisitor {
    type Value = PointsInput;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PointsInput(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(PointsInput(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // Shortest round-trip text of the float, so 729.98 stays 729.98
        Decimal::from_str(&v.to_string())
            .map(PointsInput)
            .map_err(|e| E::custom(format!("Invalid amount {}: {}", v, e)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_strict(v).map(PointsInput).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for PointsInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(PointsVisitor)
    }
}
