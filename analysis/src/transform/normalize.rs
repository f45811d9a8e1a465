//! Monetary value normalization.

use super::exponent::decode_exponent;
use crate::error::{DecodeError, DecodeResult};

/// `magnitude * 10^exponent * ratio`
pub fn normalize(magnitude: f64, exponent: i32, ratio: f64) -> f64 {
    magnitude * 10f64.powi(exponent) * ratio
}

/// Decode the exponent code, then scale and inflation-adjust the magnitude.
///
/// A non-finite result is an error.
pub fn normalize_damage(magnitude: f64, code: &str, ratio: f64) -> DecodeResult<f64> {
    let exponent = decode_exponent(code)?;
    let value = normalize(magnitude, exponent, ratio);
    if !value.is_finite() {
        return Err(DecodeError::NonFinite {
            magnitude,
            code: code.to_string(),
        });
    }
    Ok(value)
}
