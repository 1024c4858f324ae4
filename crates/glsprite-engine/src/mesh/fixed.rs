//! Q16.16 fixed-point conversion.

/// `1.0` in Q16.16.
pub const FIXED_ONE: i32 = 1 << 16;

/// Converts to Q16.16 with one multiply and truncation toward zero.
///
/// Out-of-range values saturate at the `i32` bounds; NaN maps to `0`.
#[inline]
pub fn to_fixed(value: f32) -> i32 {
    (value * FIXED_ONE as f32) as i32
}

#[inline]
pub fn from_fixed(value: i32) -> f32 {
    value as f32 / FIXED_ONE as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_is_65536() {
        assert_eq!(to_fixed(1.0), 65536);
        assert_eq!(to_fixed(-1.0), -65536);
        assert_eq!(to_fixed(0.5), 32768);
    }

    #[test]
    fn truncates_toward_zero() {
        // 1/3 * 65536 = 21845.33..
        assert_eq!(to_fixed(1.0 / 3.0), 21845);
        assert_eq!(to_fixed(-1.0 / 3.0), -21845);
    }

    #[test]
    fn saturates_and_maps_nan_to_zero() {
        assert_eq!(to_fixed(1.0e9), i32::MAX);
        assert_eq!(to_fixed(-1.0e9), i32::MIN);
        assert_eq!(to_fixed(f32::NAN), 0);
    }

    #[test]
    fn from_fixed_inverts_exact_values() {
        assert_eq!(from_fixed(to_fixed(0.25)), 0.25);
        assert_eq!(from_fixed(FIXED_ONE * 3), 3.0);
    }
}
