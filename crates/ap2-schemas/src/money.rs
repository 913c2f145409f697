//! Integer-micros money representation.
//!
//! Amounts inside the workspace are `i64` micros (1 unit = 1_000_000 micros).
//! `f64` only appears at the catalog/config boundary, converted once by
//! [`amount_to_micros`].

/// Scale factor: 1 currency unit = 1_000_000 micros.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Errors returned by [`amount_to_micros`] when the input is not representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Input was `NaN` or infinite.
    NotFinite,
    /// Input would overflow `i64` after scaling by [`MICROS_PER_UNIT`].
    OutOfRange,
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::NotFinite => write!(f, "amount is not finite (NaN or Inf)"),
            PricingError::OutOfRange => write!(f, "amount out of i64 range after scaling"),
        }
    }
}

impl std::error::Error for PricingError {}

pub fn micros_to_amount(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

/// Convert a wire amount into micros, rounding to the nearest micro.
pub fn amount_to_micros(amount: f64) -> Result<i64, PricingError> {
    if !amount.is_finite() {
        return Err(PricingError::NotFinite);
    }
    let scaled = (amount * MICROS_PER_UNIT as f64).round();
    if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(PricingError::OutOfRange);
    }
    Ok(scaled as i64)
}

/// Human form, e.g. `AED 129.99`. Rounds to two decimals for display only.
pub fn format_amount(micros: i64, currency: &str) -> String {
    format!("{} {:.2}", currency, micros_to_amount(micros))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_micro() {
        assert_eq!(amount_to_micros(129.99).unwrap(), 129_990_000);
        assert_eq!(amount_to_micros(-1.5).unwrap(), -1_500_000);
    }

    #[test]
    fn rejects_non_finite_and_overflow() {
        assert_eq!(amount_to_micros(f64::NAN), Err(PricingError::NotFinite));
        assert_eq!(amount_to_micros(f64::INFINITY), Err(PricingError::NotFinite));
        assert_eq!(amount_to_micros(1e20), Err(PricingError::OutOfRange));
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_amount(129_990_000, "AED"), "AED 129.99");
    }
}
