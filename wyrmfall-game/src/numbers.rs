//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a collection length to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a collection length to u32, saturating at `u32::MAX`.
#[must_use]
pub fn usize_to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Health fraction `current / max`, clamped to `[0, 1]`.
///
/// Returns 0.0 when either side is non-finite or `max` is not positive, so a
/// broken health report reads as "no health left" rather than poisoning the
/// phase thresholds with NaN.
#[must_use]
pub fn health_fraction(current: f64, max: f64) -> f64 {
    if !current.is_finite() || !max.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (current / max).clamp(0.0, 1.0)
}

/// Replace a non-finite or non-positive multiplier with `fallback`.
#[must_use]
pub fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_handles_degenerate_inputs() {
        assert!((health_fraction(50.0, 200.0) - 0.25).abs() < f64::EPSILON);
        assert!(health_fraction(f64::NAN, 200.0).abs() < f64::EPSILON);
        assert!(health_fraction(10.0, 0.0).abs() < f64::EPSILON);
        assert!((health_fraction(300.0, 200.0) - 1.0).abs() < f64::EPSILON);
        assert!(health_fraction(-5.0, 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn casts_cover_ranges() {
        assert!((usize_to_f64(4) - 4.0).abs() < f64::EPSILON);
        assert_eq!(usize_to_u32(7), 7);
        assert!((positive_or(f64::INFINITY, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((positive_or(-2.0, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((positive_or(1.5, 1.0) - 1.5).abs() < f64::EPSILON);
    }
}
