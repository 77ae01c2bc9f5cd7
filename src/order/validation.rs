//! Order number validation
//!
//! Order numbers are decimal digit strings protected by a Luhn check digit.
//! [`OrderNumber`] keeps its field private so every instance has passed
//! [`OrderNumber::parse`].

use std::fmt;

/// Longest order number accepted, in digits
pub const MAX_ORDER_NUMBER_LEN: usize = 32;

// ============================================================================
// Validation Errors
// ============================================================================

/// Reasons an order number is rejected
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Order number is empty")]
    Empty,

    #[error("Order number too long: {actual} digits (max {max})")]
    TooLong { max: usize, actual: usize },

    #[error("Order number must contain digits only: got '{0}'")]
    NonDigit(String),

    #[error("Order number fails the Luhn check: '{0}'")]
    ChecksumMismatch(String),
}

// ============================================================================
// Luhn
// ============================================================================

/// Luhn (mod 10) check over an ASCII digit string.
///
/// Returns `false` for anything that is not a non-empty run of `0-9`.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

// ============================================================================
// OrderNumber - Validated Order Number (Private Field)
// ============================================================================

/// Validated order number (digits only, Luhn-valid)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Parse and validate an order number.
    ///
    /// # Validation Rules
    /// - Surrounding whitespace is ignored
    /// - 1-32 ASCII digits
    /// - Luhn check digit must match
    ///
    /// # Examples
    /// ```
    /// use loyalty_mart::order::OrderNumber;
    ///
    /// assert!(OrderNumber::parse("79927398713").is_ok());
    /// assert!(OrderNumber::parse("79927398710").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(ValidationError::Empty);
        }

        if text.len() > MAX_ORDER_NUMBER_LEN {
            return Err(ValidationError::TooLong {
                max: MAX_ORDER_NUMBER_LEN,
                actual: text.len(),
            });
        }

        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::NonDigit(text.to_string()));
        }

        if !luhn_valid(text) {
            return Err(ValidationError::ChecksumMismatch(text.to_string()));
        }

        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luhn_known_numbers() {
        assert!(luhn_valid("79927398713"));
        assert!(luhn_valid("12345678903"));
        assert!(luhn_valid("4561261212345467"));
        assert!(luhn_valid("2377225624"));
        assert!(luhn_valid("0"));

        assert!(!luhn_valid("79927398710"));
        assert!(!luhn_valid("12345678904"));
    }

    #[test]
    fn test_luhn_rejects_non_digits() {
        assert!(!luhn_valid(""));
        assert!(!luhn_valid("7992739871a"));
        assert!(!luhn_valid("-79927398713"));
        assert!(!luhn_valid("7992 7398 713"));
    }

    #[test]
    fn test_order_number_valid() {
        let number = OrderNumber::parse("79927398713").unwrap();
        assert_eq!(number.as_str(), "79927398713");
        assert_eq!(number.to_string(), "79927398713");
    }

    #[test]
    fn test_order_number_trims_whitespace() {
        let number = OrderNumber::parse("  12345678903\n").unwrap();
        assert_eq!(number.as_str(), "12345678903");
    }

    #[test]
    fn test_order_number_checksum_mismatch() {
        let err = OrderNumber::parse("79927398710").unwrap_err();
        assert_eq!(
            err,
            ValidationError::ChecksumMismatch("79927398710".to_string())
        );
    }

    #[test]
    fn test_order_number_empty() {
        assert_eq!(OrderNumber::parse("").unwrap_err(), ValidationError::Empty);
        assert_eq!(OrderNumber::parse("   ").unwrap_err(), ValidationError::Empty);
    }

    #[test]
    fn test_order_number_non_digit() {
        let err = OrderNumber::parse("1234-5678").unwrap_err();
        assert!(matches!(err, ValidationError::NonDigit(_)));

        // Signs and decimal points are not digits
        assert!(matches!(
            OrderNumber::parse("+18").unwrap_err(),
            ValidationError::NonDigit(_)
        ));
        assert!(matches!(
            OrderNumber::parse("1.8").unwrap_err(),
            ValidationError::NonDigit(_)
        ));
    }

    #[test]
    fn test_order_number_too_long() {
        let long = "0".repeat(MAX_ORDER_NUMBER_LEN + 1);
        let err = OrderNumber::parse(&long).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { actual: 33, .. }));

        // Exactly at the limit is fine (all zeros sum to 0)
        assert!(OrderNumber::parse(&"0".repeat(MAX_ORDER_NUMBER_LEN)).is_ok());
    }
}
