//! Decimal <-> minor-unit conversion
//!
//! Conversion is exact in both directions: human amounts are parsed as
//! decimal strings (never floats), inputs with more fractional digits than
//! the token supports are rejected, and formatting drops trailing zeros
//! only (`1500000000000000000` wei formats as `"1.5"`, `10^18` as `"1"`).

use crate::U256;
use num_traits::{One, Pow, Zero};
use thiserror::Error;

/// Decimals of the native token (ether / wei)
pub const ETHER_DECIMALS: u32 = 18;

#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("Empty amount")]
    Empty,

    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Too many decimal places: {digits} given, at most {max} supported")]
    ExcessPrecision { digits: usize, max: u32 },

    #[error("Amount exceeds 256 bits: {0}")]
    Overflow(String),
}

fn ten_pow(decimals: u32) -> U256 {
    Pow::pow(U256::from(10u8), decimals)
}

fn uint_max() -> U256 {
    (U256::one() << 256u32) - U256::one()
}

/// Parse a human decimal amount (e.g. `"1.5"`) into minor units
pub fn parse_units(amount: &str, decimals: u32) -> Result<U256, UnitError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitError::Invalid(amount.to_string()));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UnitError::Invalid(amount.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitError::ExcessPrecision {
            digits: fraction.len(),
            max: decimals,
        });
    }

    let whole_value = if whole.is_empty() {
        U256::zero()
    } else {
        whole
            .parse::<U256>()
            .map_err(|e| UnitError::Invalid(e.to_string()))?
    };

    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction_value = if padded.is_empty() {
        U256::zero()
    } else {
        padded
            .parse::<U256>()
            .map_err(|e| UnitError::Invalid(e.to_string()))?
    };

    let value = whole_value * ten_pow(decimals) + fraction_value;
    if value > uint_max() {
        return Err(UnitError::Overflow(amount.to_string()));
    }
    Ok(value)
}

/// Format minor units as a human decimal string without trailing zeros
pub fn format_units(value: &U256, decimals: u32) -> String {
    let unit = ten_pow(decimals);
    let whole = value / &unit;
    let fraction = value % &unit;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_ether_amounts() {
        assert_eq!(parse_units("1.5", ETHER_DECIMALS).unwrap(), wei("1500000000000000000"));
        assert_eq!(parse_units("1", ETHER_DECIMALS).unwrap(), wei("1000000000000000000"));
        assert_eq!(parse_units(".25", ETHER_DECIMALS).unwrap(), wei("250000000000000000"));
        assert_eq!(parse_units("3.", ETHER_DECIMALS).unwrap(), wei("3000000000000000000"));
        assert_eq!(parse_units("0.000000000000000001", ETHER_DECIMALS).unwrap(), wei("1"));
        assert_eq!(parse_units(" 2 ", 0).unwrap(), wei("2"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_units("", ETHER_DECIMALS), Err(UnitError::Empty));
        assert!(matches!(parse_units(".", ETHER_DECIMALS), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_units("-1", ETHER_DECIMALS), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_units("1.2.3", ETHER_DECIMALS), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_units("1e18", ETHER_DECIMALS), Err(UnitError::Invalid(_))));
        assert_eq!(
            parse_units("0.0000000000000000001", ETHER_DECIMALS),
            Err(UnitError::ExcessPrecision { digits: 19, max: 18 })
        );
    }

    #[test]
    fn test_parse_overflow() {
        let huge = "1".repeat(70);
        assert!(matches!(parse_units(&huge, ETHER_DECIMALS), Err(UnitError::Overflow(_))));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(&wei("1500000000000000000"), ETHER_DECIMALS), "1.5");
        assert_eq!(format_units(&wei("1000000000000000000"), ETHER_DECIMALS), "1");
        assert_eq!(format_units(&wei("0"), ETHER_DECIMALS), "0");
        assert_eq!(format_units(&wei("1"), ETHER_DECIMALS), "0.000000000000000001");
        assert_eq!(format_units(&wei("1500000000000"), ETHER_DECIMALS), "0.0000015");
    }

    #[test]
    fn test_format_then_parse_is_exact() {
        let value = wei("123456789012345678901");
        let text = format_units(&value, ETHER_DECIMALS);
        assert_eq!(text, "123.456789012345678901");
        assert_eq!(parse_units(&text, ETHER_DECIMALS).unwrap(), value);
    }
}
