//! Damage exponent decoding.
//!
//! `PROPDMGEXP` / `CROPDMGEXP` carry the power of ten applied to the
//! magnitude column: a unit letter, a placeholder symbol, or a bare digit.

use crate::error::{DecodeError, DecodeResult};

/// Decode an exponent code into a power of ten.
///
/// | Code                     | Exponent |
/// |--------------------------|----------|
/// | `h` / `H`                | 2        |
/// | `k` / `K`                | 3        |
/// | `m` / `M`                | 6        |
/// | `b` / `B`                | 9        |
/// | `""`, `-`, `?`, `+`      | 0        |
/// | integral number (`"3"`)  | its value |
///
/// Numeric codes must be integral (`"5.0"` is 5, `"2.5"` is invalid) and
/// `10^value` must be a finite `f64` (`"400"` is invalid).
/// The code is compared as-is: `" K"` is invalid.
pub fn decode_exponent(code: &str) -> DecodeResult<i32> {
    match code {
        "h" | "H" => Ok(2),
        "k" | "K" => Ok(3),
        "m" | "M" => Ok(6),
        "b" | "B" => Ok(9),
        "" | "-" | "?" | "+" => Ok(0),
        other => parse_numeric(other).ok_or_else(|| DecodeError::InvalidExponent(other.to_string())),
    }
}

/// `10^exponent` for a code.
pub fn multiplier(code: &str) -> DecodeResult<f64> {
    decode_exponent(code).map(|e| 10f64.powi(e))
}

fn parse_numeric(code: &str) -> Option<i32> {
    // f64 parsing also accepts "inf" and "nan"
    let value: f64 = code.parse().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    let exponent = value as i32;
    if !10f64.powi(exponent).is_finite() {
        return None;
    }
    Some(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_codes_case_insensitive() {
        let codes = ["h", "H", "k", "K", "m", "M", "b", "B"];
        let expected = [2, 2, 3, 3, 6, 6, 9, 9];
        for (code, exp) in codes.iter().zip(expected) {
            assert_eq!(decode_exponent(code), Ok(exp), "code {:?}", code);
        }
    }

    #[test]
    fn test_placeholder_codes_are_zero() {
        for code in ["", "-", "?", "+"] {
            assert_eq!(decode_exponent(code), Ok(0), "code {:?}", code);
        }
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(decode_exponent("0"), Ok(0));
        assert_eq!(decode_exponent("3"), Ok(3));
        assert_eq!(decode_exponent("8"), Ok(8));
        assert_eq!(decode_exponent("5.0"), Ok(5));
        assert_eq!(decode_exponent("308"), Ok(308));
    }

    #[test]
    fn test_overflowing_codes_rejected() {
        for code in ["309", "400", "1e6"] {
            assert_eq!(
                decode_exponent(code),
                Err(DecodeError::InvalidExponent(code.to_string())),
                "code {:?}",
                code
            );
        }
    }

    #[test]
    fn test_invalid_codes() {
        for code in ["x", "Z", " K", "K ", "2.5", "inf", "NaN", "kk"] {
            assert_eq!(
                decode_exponent(code),
                Err(DecodeError::InvalidExponent(code.to_string())),
                "code {:?}",
                code
            );
        }
    }

    #[test]
    fn test_multiplier() {
        assert_eq!(multiplier("K").unwrap(), 1_000.0);
        assert_eq!(multiplier("").unwrap(), 1.0);
        assert_eq!(multiplier("B").unwrap(), 1e9);
        assert!(multiplier("x").is_err());
    }
}
