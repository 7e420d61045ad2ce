//! Jittered Sampler.

use super::*;
use photon_core::rng::*;
use photon_core::sampling::*;

/// Stratifies first bounce directions on a square grid and picks deeper
/// bounces at random.
pub struct JitteredSampler {
    /// Grid side; the sample count is `grid²`.
    grid: usize,

    /// Reciprocal of `grid`.
    grid_inv: Float,

    /// Largest sample index requested since `sampling_from`.
    taken: usize,

    /// The random number generator.
    rng: RNG,
}

impl JitteredSampler {
    /// Create a new `JitteredSampler`. The sample count is rounded down to a
    /// perfect square.
    ///
    /// * `samples` - Number of samples.
    /// * `rng`     - Random number generator.
    pub fn new(samples: usize, rng: RNG) -> Self {
        let (_, grid) = floor_square(samples.max(1));
        Self {
            grid,
            grid_inv: 1.0 / grid as Float,
            taken: 0,
            rng,
        }
    }
}

impl HemiSampler for JitteredSampler {
    fn sampling_from(&mut self, _state: &mut RenderState, _p: &Point3f, _n: &Vector3f, _ru: &Vector3f, _rv: &Vector3f) {
        self.taken = 0;
    }

    fn next_direction(
        &mut self,
        _p: &Point3f,
        n: &Vector3f,
        ru: &Vector3f,
        rv: &Vector3f,
        cur_sample: usize,
        level: usize,
        _ray_color: &mut Spectrum,
    ) -> Vector3f {
        self.taken = self.taken.max(cur_sample);
        let (z1, z2) = if level == 0 {
            let cell = cur_sample % (self.grid * self.grid);
            (
                ((cell / self.grid) as Float + self.rng.uniform_float()) * self.grid_inv,
                ((cell % self.grid) as Float + self.rng.uniform_float()) * self.grid_inv,
            )
        } else {
            (self.rng.uniform_float(), self.rng.uniform_float())
        };
        cosine_sample_hemisphere(n, ru, rv, z1, z2)
    }

    fn multiplier(&self) -> Float {
        1.0 / (self.taken + 1) as Float
    }

    fn reset(&mut self) {
        self.taken = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn directions_stay_in_hemisphere() {
        let mut sampler = JitteredSampler::new(20, RNG::new(3));
        let mut state = RenderState::new(RNG::new(0));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        sampler.sampling_from(&mut state, &Point3f::ORIGIN, &n, &ru, &rv);

        let mut color = Spectrum::ONE;
        for i in 0..16 {
            for level in 0..3 {
                let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, i, level, &mut color);
                assert!(d.dot(&n) >= 0.0);
                assert!(approx_eq!(f32, d.length(), 1.0, epsilon = 1e-4));
            }
        }
        assert_eq!(color, Spectrum::ONE);
        assert!(approx_eq!(f32, sampler.multiplier(), 1.0 / 16.0));

        sampler.reset();
        assert_eq!(sampler.multiplier(), 1.0);
    }

    #[test]
    fn first_level_is_stratified() {
        // With 4 samples the four quadrants of the unit square are each hit
        // once.
        let mut sampler = JitteredSampler::new(4, RNG::new(7));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        let mut color = Spectrum::ONE;
        let mut cos2 = vec![];
        for i in 0..4 {
            let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, i, 0, &mut color);
            cos2.push(d.z * d.z);
        }
        assert!(cos2[0] < 0.5 + 1e-5 && cos2[1] < 0.5 + 1e-5);
        assert!(cos2[2] >= 0.5 - 1e-5 && cos2[3] >= 0.5 - 1e-5);
    }
}
