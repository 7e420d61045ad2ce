//! Halton Sampler.

use super::*;
use photon_core::low_discrepancy::*;
use photon_core::sampling::*;

/// Quasi-random hemisphere sampler. Each bounce level owns a pair of Halton
/// sequences with distinct prime bases.
pub struct HaltonSampler {
    /// Two generators per bounce level.
    generators: Vec<Halton>,

    /// Largest sample index requested since `sampling_from`.
    taken: usize,
}

impl HaltonSampler {
    /// Create a new `HaltonSampler`.
    ///
    /// * `depth` - Maximum bounce level.
    pub fn new(depth: usize) -> Self {
        Self {
            generators: halton_generators(2 * (depth + 1)),
            taken: 0,
        }
    }
}

impl HemiSampler for HaltonSampler {
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
        let l = 2 * min(level, self.generators.len() / 2 - 1);
        let z1 = self.generators[l].next_value();
        let z2 = self.generators[l + 1].next_value();
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
    use photon_core::rng::RNG;
    use proptest::prelude::*;

    #[test]
    fn levels_use_distinct_sequences() {
        let mut sampler = HaltonSampler::new(2);
        assert_eq!(sampler.generators.len(), 6);
        let bases: Vec<u32> = sampler.generators.iter().map(|h| h.base()).collect();
        assert_eq!(bases, vec![2, 3, 5, 7, 11, 13]);

        let mut state = RenderState::new(RNG::new(0));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        sampler.sampling_from(&mut state, &Point3f::ORIGIN, &n, &ru, &rv);
        let mut color = Spectrum::ONE;

        // First base-2 value is 0.5, so cos² θ = 0.5.
        let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, 0, 0, &mut color);
        assert!((d.z * d.z - 0.5).abs() < 1e-5);

        // Levels beyond the configured depth reuse the deepest pair.
        let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, 3, 9, &mut color);
        assert!(d.dot(&n) >= 0.0);
        assert_eq!(sampler.multiplier(), 0.25);
    }

    proptest! {
        #[test]
        fn directions_stay_above_surface(
            x in -1.0..1.0f32,
            y in -1.0..1.0f32,
            z in 0.1..1.0f32,
            level in 0..6usize,
        ) {
            let n = Vector3f::new(x, y, z).normalize();
            let (ru, rv) = coordinate_system(&n);
            let mut sampler = HaltonSampler::new(3);
            let mut color = Spectrum::ONE;
            for i in 0..16 {
                let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, i, level, &mut color);
                prop_assert!(d.dot(&n) >= -1e-5);
            }
            prop_assert_eq!(color, Spectrum::ONE);
        }
    }
}
