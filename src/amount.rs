//! Signed monetary amount.
//!
//! Wraps `rust_decimal` so statement amounts are carried exactly instead of
//! as binary floating point. Statements encode amounts as zero-padded digit
//! runs ("00000000017840"), plain decimals or spreadsheet numbers.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// A signed decimal amount.
///
/// Negative values are outflows once a row has been normalized.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use cartola_converter::Amount;
///
/// let amount = Amount::from_str("00000000017840").unwrap();
/// assert_eq!((-amount).to_string(), "-17840");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Creates an amount from a `Decimal`.
    pub fn new(value: Decimal) -> Self {
        Amount(value)
    }

    /// Converts a spreadsheet number. Returns `None` for NaN or infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(|d| Amount(d.normalize()))
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Amount)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        if self.0.is_zero() {
            Amount(Decimal::ZERO)
        } else {
            Amount(-self.0)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_strips_zero_padding() {
        let a = Amount::from_str("00000000646503").unwrap();
        assert_eq!(a.to_string(), "646503");

        let a = Amount::from_str("  12.50  ").unwrap();
        assert_eq!(a.to_string(), "12.50");
    }

    #[test]
    fn test_from_str_accepts_signs_and_exponents() {
        assert_eq!(Amount::from_str("-3.5").unwrap().to_string(), "-3.5");
        assert_eq!(Amount::from_str("+7").unwrap().to_string(), "7");
        assert_eq!(Amount::from_str("1e3").unwrap().to_string(), "1000");
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("").is_err());
    }

    #[test]
    fn test_negation() {
        let a = Amount::from_str("100").unwrap();
        assert_eq!((-a).to_string(), "-100");
        assert!((-a).is_negative());
        assert_eq!(-(-a), a);
    }

    #[test]
    fn test_negating_zero_stays_zero() {
        let z = -Amount::ZERO;
        assert!(z.is_zero());
        assert!(!z.is_negative());
        assert_eq!(z.to_string(), "0");
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Amount::from_f64(15990.0).unwrap().to_string(), "15990");
        assert_eq!(Amount::from_f64(12.25).unwrap().to_string(), "12.25");
        assert!(Amount::from_f64(f64::NAN).is_none());
    }
}
