use std::num::ParseIntError;

use tracing::error;

/// Malformed fixed-point amount string.
#[derive(Debug, thiserror::Error)]
#[error("invalid fixed-point amount {amount:?}: {source}")]
pub struct AmountParseError {
    amount: String,
    #[source]
    source: ParseIntError,
}

/// Fixed-point to float converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals: decimals.min(i32::MAX as u32) as i32,
        }
    }

    /// Parses an integer amount string and scales it by `10^-decimals`.
    ///
    /// Amounts are parsed as signed 128-bit integers, 18-decimal quantities
    /// of any realistic size fit. A leading sign is accepted, whitespace is not.
    pub fn from_amount(&self, amount: &str) -> Result<f64, AmountParseError> {
        let unscaled = amount.parse::<i128>().map_err(|source| AmountParseError {
            amount: amount.to_string(),
            source,
        })?;
        // 10^n is exact in f64 up to n = 22, so dividing keeps the result correctly rounded
        Ok(unscaled as f64 / 10f64.powi(self.decimals))
    }

    /// Inverse of [`Converter::from_amount`], rounded to the nearest unit.
    pub fn to_fixed(&self, value: f64) -> i128 {
        (value * 10f64.powi(self.decimals)).round() as i128
    }
}

/// Normalizes a fixed-point amount, `parse_int(amount) * 10^-decimals`.
///
/// A malformed amount is logged and normalized to `0.0`.
pub fn normalize(amount: &str, decimals: u32) -> f64 {
    Converter::new(decimals).from_amount(amount).unwrap_or_else(|e| {
        error!(%e, "error converting price to integer, using 0 price");
        0.0
    })
}
