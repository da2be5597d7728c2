//! Numeric conversion helpers centralizing safe numeric casts and rounding.

use num_traits::cast::cast;

/// Round to two decimal places, the precision cash is reported with.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round to `places` decimal places, returning 0.0 for non-finite values.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Floor a f64 and clamp it to the u64 range, returning 0 for non-finite or
/// negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).floor()).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u64 range; used for "seconds remaining".
#[must_use]
pub fn ceil_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).ceil()).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// True when the value can be used as a user supplied amount.
#[must_use]
pub fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
