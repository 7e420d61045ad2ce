//! Common

use num_traits::Num;
use std::ops::Neg;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// 4*PI (4π)
pub const FOUR_PI: Float = PI * 4.0;

/// 1/√2
pub const INV_SQRT_2: Float = std::f32::consts::FRAC_1_SQRT_2;

/// Returns the absolute value of a number.
///
/// * `n` - The number.
#[inline(always)]
pub fn abs<T>(n: T) -> T
where
    T: Num + Neg<Output = T> + PartialOrd + Copy,
{
    if n < T::zero() {
        -n
    } else {
        n
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the closed interval `[low, high]`.
///
/// * `val`  - The value.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd + Copy,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Returns gamma corrected values for use in 8-bit images.
///
/// * `value` - Value to correct.
#[inline(always)]
pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert a 32-bit floating point value to its constituent bits.
///
/// * `f` - The 32-bit floating point number.
#[inline(always)]
pub fn float_to_bits(f: f32) -> u32 {
    f.to_bits()
}

/// Convert the bits of a 32-bit unsigned interger to a floating point value.
///
/// * `i` - The 32-bit unsigned interger.
#[inline(always)]
pub fn bits_to_float(i: u32) -> f32 {
    f32::from_bits(i)
}

/// Returns the largest perfect square that does not exceed `n`, and its root.
///
/// * `n` - The number.
pub fn floor_square(n: usize) -> (usize, usize) {
    let mut root = (n as f64).sqrt() as usize;
    // Guard against rounding in the square root.
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    (root * root, root)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn floor_square_exact() {
        assert_eq!(floor_square(16), (16, 4));
        assert_eq!(floor_square(17), (16, 4));
        assert_eq!(floor_square(1), (1, 1));
        assert_eq!(floor_square(0), (0, 0));
    }

    proptest! {
        #[test]
        fn floor_square_is_largest(n in 0..100_000usize) {
            let (sq, root) = floor_square(n);
            prop_assert_eq!(sq, root * root);
            prop_assert!(sq <= n);
            prop_assert!((root + 1) * (root + 1) > n);
        }

        #[test]
        fn min_max_agree(a in -100.0..100.0f32, b in -100.0..100.0f32) {
            prop_assert!(min(a, b) <= max(a, b));
            prop_assert_eq!(min(a, b) + max(a, b), a + b);
        }
    }
}
