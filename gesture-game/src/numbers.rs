//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 half-away-from-zero and clamp it to the u32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.round().clamp(0.0, max);
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.floor().clamp(min, max);
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a length to u32, saturating at `u32::MAX`.
#[must_use]
pub fn usize_to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_f64_to_u32(84.5), 85);
        assert_eq!(round_f64_to_u32(84.4), 84);
        assert_eq!(round_f64_to_u32(-3.0), 0);
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(f64::INFINITY), u32::MAX);
    }

    #[test]
    fn floor_handles_non_finite() {
        assert_eq!(floor_f64_to_i64(3.9), 3);
        assert_eq!(floor_f64_to_i64(-0.5), -1);
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
    }

    #[test]
    fn widening_conversions() {
        assert!((usize_to_f64(50) - 50.0).abs() < f64::EPSILON);
        assert!((u64_to_f64(1710) - 1710.0).abs() < f64::EPSILON);
        assert!((i64_to_f64(-1500) + 1500.0).abs() < f64::EPSILON);
        assert_eq!(usize_to_u32(7), 7);
    }
}
