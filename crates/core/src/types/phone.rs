//! Phone number type.
//!
//! Accounts are keyed by phone number, and orders capture a recipient phone,
//! so the same validated type is used for both.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is not exactly the required number of digits.
    #[error("phone number must be exactly {expected} digits")]
    WrongLength {
        /// Required digit count.
        expected: usize,
    },
    /// The input contains a non-digit character.
    #[error("phone number must contain only digits")]
    NonDigit,
}

/// A Vietnamese mobile phone number.
///
/// ## Constraints
///
/// - Exactly 10 ASCII digits, no separators
///
/// ## Examples
///
/// ```
/// use bepviet_core::Phone;
///
/// assert!(Phone::parse("0912345678").is_ok());
///
/// assert!(Phone::parse("").is_err());           // empty
/// assert!(Phone::parse("12345").is_err());      // too short
/// assert!(Phone::parse("09123456 8").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Required number of digits.
    pub const DIGITS: usize = 10;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not exactly 10 characters,
    /// or contains anything other than ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if s.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Phone::parse("0912345678").is_ok());
        assert!(Phone::parse("0000000000").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::WrongLength { expected: 10 })
        ));
        assert!(matches!(
            Phone::parse("09123456789"),
            Err(PhoneError::WrongLength { expected: 10 })
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            Phone::parse("09123a5678"),
            Err(PhoneError::NonDigit)
        ));
        assert!(matches!(
            Phone::parse("091234567 "),
            Err(PhoneError::NonDigit)
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let phone = Phone::parse("0912345678").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"0912345678\"");

        let parsed: Phone = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, phone);
    }

    #[test]
    fn test_from_str() {
        let phone: Phone = "0912345678".parse().unwrap();
        assert_eq!(phone.as_str(), "0912345678");
    }
}
