//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{PERCENT_MAX, PERCENT_MIN};

/// Clamp a signed value into the percentage range and narrow it to `u8`.
#[must_use]
pub fn clamp_percent(value: i32) -> u8 {
    let clamped = value.clamp(i32::from(PERCENT_MIN), i32::from(PERCENT_MAX));
    cast::<i32, u8>(clamped).unwrap_or(PERCENT_MIN)
}

/// Apply an optional signed delta to a percentage, clamping the result.
#[must_use]
pub fn apply_percent_delta(value: u8, delta: Option<i32>) -> u8 {
    delta.map_or(value, |delta| clamp_percent(i32::from(value).saturating_add(delta)))
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Ratio of `part` to `whole`, or 0.0 when `whole` is zero.
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    count_to_f64(part) / count_to_f64(whole)
}

/// Round a f64 to the nearest u8, clamping and returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u8::MAX)).round();
    cast::<f64, u8>(clamped).unwrap_or(0)
}
