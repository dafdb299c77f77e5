//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 half away from zero and clamp it to the i32 range, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Convert a u32 to i32, saturating at `i32::MAX`.
#[must_use]
pub fn u32_to_i32(value: u32) -> i32 {
    cast::<u32, i32>(value).unwrap_or(i32::MAX)
}

/// Sanitize a multiplicative modifier: non-finite or negative values collapse to 0.
#[must_use]
pub fn sanitize_multiplier(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Map a raw 64-bit sample onto `[0, 1)` using its top 53 bits.
#[must_use]
pub fn unit_from_u64(sample: u64) -> f64 {
    const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
    let mantissa = sample >> 11;
    cast::<u64, f64>(mantissa).unwrap_or(0.0) * SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i32(1.6), 2);
        assert_eq!(round_f64_to_i32(9.36), 9);
        assert_eq!(round_f64_to_i32(2.5), 3);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
    }

    #[test]
    fn u32_conversion_saturates() {
        assert_eq!(u32_to_i32(42), 42);
        assert_eq!(u32_to_i32(u32::MAX), i32::MAX);
    }

    #[test]
    fn multipliers_never_go_negative() {
        assert!((sanitize_multiplier(-2.0) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_multiplier(f64::NAN) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_multiplier(1.25) - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn unit_samples_stay_below_one() {
        assert!((unit_from_u64(0) - 0.0).abs() < f64::EPSILON);
        let top = unit_from_u64(u64::MAX);
        assert!(top < 1.0);
        assert!(top > 0.999_999);
    }
}
