//! RGB Spectrum

use crate::pbrt::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Sub};

/// Number of samples in an `RGBSpectrum`.
pub const RGB_SAMPLES: usize = 3;

/// An RGB colour triple used for radiance, irradiance and reflectance.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    c: [Float; RGB_SAMPLES],
}

impl RGBSpectrum {
    /// Black.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// White.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Returns a spectrum with all channels set to `v`.
    ///
    /// * `v` - Channel value.
    pub fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Returns a spectrum from individual channels.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Red channel.
    pub fn r(&self) -> Float {
        self.c[0]
    }

    /// Green channel.
    pub fn g(&self) -> Float {
        self.c[1]
    }

    /// Blue channel.
    pub fn b(&self) -> Float {
        self.c[2]
    }

    /// Average of the channels. Used as the scalar throughput of a colour.
    pub fn energy(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) * (1.0 / 3.0)
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    /// Returns true if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Largest absolute per-channel difference to another spectrum.
    ///
    /// * `other` - The other spectrum.
    pub fn max_abs_diff(&self, other: &Self) -> Float {
        (0..RGB_SAMPLES).fold(0.0, |m, i| max(m, abs(self.c[i] - other.c[i])))
    }

    /// Per-channel minimum.
    ///
    /// * `other` - The other spectrum.
    pub fn min(&self, other: &Self) -> Self {
        Self::from_rgb(
            min(self.c[0], other.c[0]),
            min(self.c[1], other.c[1]),
            min(self.c[2], other.c[2]),
        )
    }

    /// Per-channel maximum.
    ///
    /// * `other` - The other spectrum.
    pub fn max(&self, other: &Self) -> Self {
        Self::from_rgb(
            max(self.c[0], other.c[0]),
            max(self.c[1], other.c[1]),
            max(self.c[2], other.c[2]),
        )
    }

    /// Clamps every channel to [0, 1].
    pub fn clamp01(&self) -> Self {
        Self::from_rgb(
            clamp(self.c[0], 0.0, 1.0),
            clamp(self.c[1], 0.0, 1.0),
            clamp(self.c[2], 0.0, 1.0),
        )
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::from_rgb(self.c[0] + other.c[0], self.c[1] + other.c[1], self.c[2] + other.c[2])
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, other: Self) {
        for i in 0..RGB_SAMPLES {
            self.c[i] += other.c[i];
        }
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::from_rgb(self.c[0] - other.c[0], self.c[1] - other.c[1], self.c[2] - other.c[2])
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::from_rgb(self.c[0] * other.c[0], self.c[1] * other.c[1], self.c[2] * other.c[2])
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, other: Self) {
        for i in 0..RGB_SAMPLES {
            self.c[i] *= other.c[i];
        }
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self {
        Self::from_rgb(self.c[0] * f, self.c[1] * f, self.c[2] * f)
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, f: Float) {
        for v in self.c.iter_mut() {
            *v *= f;
        }
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> RGBSpectrum {
        s * self
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self {
        debug_assert!(f != 0.0);
        let inv = 1.0 / f;
        self * inv
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl IndexMut<usize> for RGBSpectrum {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.c[i]
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rgb() -> impl Strategy<Value = RGBSpectrum> {
        (0.0..10.0f32, 0.0..10.0f32, 0.0..10.0f32).prop_map(|(r, g, b)| RGBSpectrum::from_rgb(r, g, b))
    }

    #[test]
    fn energy_is_channel_average() {
        assert_eq!(RGBSpectrum::from_rgb(3.0, 0.0, 0.0).energy(), 1.0);
        assert_eq!(RGBSpectrum::ZERO.energy(), 0.0);
    }

    #[test]
    fn clamp01_limits_channels() {
        let c = RGBSpectrum::from_rgb(-1.0, 0.5, 2.0).clamp01();
        assert_eq!(c, RGBSpectrum::from_rgb(0.0, 0.5, 1.0));
    }

    proptest! {
        #[test]
        fn max_abs_diff_is_symmetric(a in rgb(), b in rgb()) {
            prop_assert_eq!(a.max_abs_diff(&b), b.max_abs_diff(&a));
            prop_assert_eq!(a.max_abs_diff(&a), 0.0);
        }

        #[test]
        fn min_below_max(a in rgb(), b in rgb()) {
            let lo = a.min(&b);
            let hi = a.max(&b);
            for i in 0..RGB_SAMPLES {
                prop_assert!(lo[i] <= hi[i]);
            }
        }
    }
}
