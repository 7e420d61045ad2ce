//! Photon Importance Sampler.

use super::*;
use accelerators::*;
use photon_core::low_discrepancy::*;
use photon_core::rng::*;
use std::sync::Arc;

/// Splits the hemisphere into parallels and meridians and spends more first
/// bounce samples in bins whose photon energy differs from their
/// neighbours.
pub struct PhotonSampler {
    /// Number of samples per point.
    samples: usize,

    /// Photon map used to estimate incoming energy.
    photon_map: Arc<PhotonMap>,

    /// Number of bins along the polar angle.
    parallels: usize,

    /// Number of bins along the azimuth.
    meridians: usize,

    /// Number of photons gathered per point.
    search: usize,

    /// `parallels * meridians`.
    sectors: usize,

    /// Reciprocal of `parallels`.
    pdiv: Float,

    /// Azimuth covered by one meridian.
    mdiv: Float,

    /// Samples assigned to each bin.
    hits: Vec<usize>,

    /// Compensation weight of each bin.
    weight: Vec<Float>,

    /// Photon energy collected in each bin.
    energy: Vec<Spectrum>,

    /// Gather radius carried between points.
    radius: Float,

    /// Normalization factor.
    multi: Float,

    /// Current bin (parallel, meridian) and sample within it.
    current: [usize; 3],

    /// Two generators per bounce level.
    generators: Vec<Halton>,
}

impl PhotonSampler {
    /// Create a new `PhotonSampler`.
    ///
    /// * `samples`    - Number of samples per point.
    /// * `depth`      - Maximum bounce level.
    /// * `photon_map` - Photon map.
    /// * `grid`       - Approximate number of hemisphere bins.
    /// * `rng`        - Random number generator used to offset the Halton
    ///                  sequences.
    pub fn new(samples: usize, depth: usize, photon_map: Arc<PhotonMap>, grid: usize, rng: &mut RNG) -> Self {
        let mut generators = halton_generators(2 * (depth + 1));
        for h in generators.iter_mut() {
            h.set_start(rng.uniform_u32() >> 8);
        }

        let parallels = max(1, ((grid as Float / 2.0).sqrt() + 0.5) as usize);
        let meridians = 2 * parallels;
        let sectors = parallels * meridians;
        let radius = photon_map.max_radius();
        debug!("Using hemisphere grid of {meridians}x{parallels}");
        Self {
            samples,
            photon_map,
            parallels,
            meridians,
            search: 3 * sectors,
            sectors,
            pdiv: 1.0 / parallels as Float,
            mdiv: TWO_PI / meridians as Float,
            hits: vec![0; sectors],
            weight: vec![0.0; sectors],
            energy: vec![Spectrum::ZERO; sectors],
            radius,
            multi: 1.0,
            current: [0; 3],
            generators,
        }
    }

    /// Returns the bin index for (parallel, meridian).
    fn bin(&self, i: usize, j: usize) -> usize {
        i * self.meridians + j
    }

    /// Returns the (parallel, meridian) bin of a direction.
    ///
    /// * `v`  - Unit direction.
    /// * `n`  - Surface normal.
    /// * `ru` - First tangent.
    /// * `rv` - Second tangent.
    fn coords(&self, v: &Vector3f, n: &Vector3f, ru: &Vector3f, rv: &Vector3f) -> (usize, usize) {
        let mut x = v.dot(ru);
        let mut y = v.dot(rv);
        let z = v.dot(n);
        let fix = min(max(0.0, 1.0 - z * z).sqrt(), 1.0);

        let first = min((fix / self.pdiv) as usize, self.parallels - 1);
        if fix != 0.0 {
            x /= fix;
            y /= fix;
        }
        let mut angle = clamp(x, -1.0, 1.0).acos();
        if y < 0.0 {
            angle = TWO_PI - angle;
        }
        let second = min((angle / self.mdiv) as usize, self.meridians - 1);
        (first, second)
    }

    /// Returns the largest per-channel energy difference between a bin and
    /// its up to 8 neighbours.
    ///
    /// * `i` - Parallel.
    /// * `j` - Meridian.
    fn max_diff(&self, i: usize, j: usize) -> Float {
        let center = self.energy[self.bin(i, j)];
        let mut diff: Float = 0.0;
        for ni in i.saturating_sub(1)..=min(i + 1, self.parallels - 1) {
            for nj in j.saturating_sub(1)..=min(j + 1, self.meridians - 1) {
                if ni != i || nj != j {
                    diff = max(diff, self.energy[self.bin(ni, nj)].max_abs_diff(&center));
                }
            }
        }
        diff
    }

    /// Advance to the next sample, moving to the next bin once the current
    /// one has received all its hits.
    fn next_sample(&mut self) {
        self.current[2] += 1;
        if self.current[2] >= self.hits[self.bin(self.current[0], self.current[1])] {
            self.current[2] = 0;
            self.current[1] += 1;
            if self.current[1] == self.meridians {
                self.current[1] = 0;
                self.current[0] += 1;
                if self.current[0] == self.parallels {
                    self.current[0] = 0;
                }
            }
        }
    }

    /// Returns the number of samples assigned to each bin in row-major
    /// (parallel, meridian) order.
    pub fn hits(&self) -> &[usize] {
        &self.hits
    }
}

impl HemiSampler for PhotonSampler {
    fn sampling_from(&mut self, _state: &mut RenderState, p: &Point3f, n: &Vector3f, ru: &Vector3f, rv: &Vector3f) {
        let photon_map = Arc::clone(&self.photon_map);
        let mut found = Vec::with_capacity(self.search + 1);
        photon_map.gather(p, n, &mut found, self.search, &mut self.radius, 0.0);

        self.hits.iter_mut().for_each(|h| *h = 0);
        self.energy.iter_mut().for_each(|e| *e = Spectrum::ZERO);
        for f in found.iter() {
            let dir = f.photon.direction();
            if dir.dot(n) > 0.0 {
                let (i, j) = self.coords(&dir, n, ru, rv);
                let b = self.bin(i, j);
                self.energy[b] += f.photon.color;
            }
        }

        let mut total_diff = 0.0;
        for i in 0..self.parallels {
            for j in 0..self.meridians {
                let w = self.max_diff(i, j);
                let b = self.bin(i, j);
                self.weight[b] = w;
                total_diff += w;
            }
        }

        let mut assign = self.samples.saturating_sub(self.sectors);
        let per_diff = if total_diff != 0.0 {
            assign as Float / total_diff
        } else {
            0.0
        };
        for b in 0..self.sectors {
            let h = min((per_diff * self.weight[b] + 0.5) as usize, assign);
            assign -= h;
            self.hits[b] = h + 1;
        }

        // Hand out the rounding remainder, preferring bins that already
        // received extra samples.
        let mut any_bin = false;
        while assign > 0 {
            for b in 0..self.sectors {
                if assign == 0 {
                    break;
                }
                if self.hits[b] > 1 || any_bin {
                    self.hits[b] += 1;
                    assign -= 1;
                }
            }
            any_bin = true;
        }

        let max_hits = self.hits.iter().copied().max().unwrap_or(1).max(1) as Float;
        for b in 0..self.sectors {
            self.weight[b] = max_hits / self.hits[b] as Float;
        }
        self.multi = 1.0 / (max_hits * self.sectors as Float);
        self.current = [0; 3];
    }

    fn next_direction(
        &mut self,
        _p: &Point3f,
        n: &Vector3f,
        ru: &Vector3f,
        rv: &Vector3f,
        _cur_sample: usize,
        level: usize,
        ray_color: &mut Spectrum,
    ) -> Vector3f {
        let (z1, z2) = if level == 0 {
            let z1 = (self.current[0] as Float + self.generators[0].next_value()) * self.pdiv;
            let z2 = (self.current[1] as Float + self.generators[1].next_value()) * self.mdiv;
            *ray_color *= self.weight[self.bin(self.current[0], self.current[1])] * 2.0 * z1;
            self.next_sample();
            (z1, z2)
        } else {
            let l = 2 * min(level, self.generators.len() / 2 - 1);
            (
                self.generators[l].next_value(),
                self.generators[l + 1].next_value() * TWO_PI,
            )
        };

        let z1 = min(z1, 1.0);
        (*ru * z2.cos() + *rv * z2.sin()) * z1 + *n * (1.0 - z1 * z1).sqrt()
    }

    fn multiplier(&self) -> Float {
        self.multi
    }

    fn reset(&mut self) {
        self.current = [0; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    fn lit_map(dir: Vector3f) -> Arc<PhotonMap> {
        let mut map = PhotonMap::new(1.0);
        for i in 0..20 {
            for j in 0..20 {
                let p = Point3f::new(i as Float * 0.05 - 0.5, j as Float * 0.05 - 0.5, 0.0);
                map.store(StoredPhoton::new(p, Spectrum::ONE, &dir));
            }
        }
        map.build_tree();
        Arc::new(map)
    }

    #[test]
    fn grid_layout() {
        let sampler = PhotonSampler::new(100, 3, lit_map(Vector3f::Z_AXIS), 36, &mut RNG::new(1));
        assert_eq!(sampler.parallels, 4);
        assert_eq!(sampler.meridians, 8);
        assert_eq!(sampler.sectors, 32);
        assert_eq!(sampler.search, 96);
    }

    #[test]
    fn hits_add_up_to_samples() {
        let dir = Vector3f::new(0.6, 0.0, 0.8);
        let mut sampler = PhotonSampler::new(100, 3, lit_map(dir), 36, &mut RNG::new(1));
        let mut state = RenderState::new(RNG::new(0));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        sampler.sampling_from(&mut state, &Point3f::ORIGIN, &n, &ru, &rv);

        assert_eq!(sampler.hits().iter().sum::<usize>(), 100);
        assert!(sampler.hits().iter().all(|&h| h >= 1));
        let max_hits = *sampler.hits().iter().max().unwrap() as Float;
        assert!(approx_eq!(f32, sampler.multiplier(), 1.0 / (max_hits * 32.0), ulps = 4));

        let mut color = Spectrum::ONE;
        for i in 0..100 {
            let mut c = Spectrum::ONE;
            let d = sampler.next_direction(&Point3f::ORIGIN, &n, &ru, &rv, i, 0, &mut c);
            assert!(d.dot(&n) >= -1e-5);
            color = color.max(&c);
        }
        assert!(color[0] >= 1.0);
    }

    #[test]
    fn fewer_samples_than_sectors() {
        let mut sampler = PhotonSampler::new(4, 1, lit_map(Vector3f::Z_AXIS), 36, &mut RNG::new(1));
        let mut state = RenderState::new(RNG::new(0));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        sampler.sampling_from(&mut state, &Point3f::ORIGIN, &n, &ru, &rv);
        assert!(sampler.hits().iter().all(|&h| h == 1));
        assert_eq!(sampler.multiplier(), 1.0 / 32.0);
    }

    #[test]
    fn coords_cover_hemisphere() {
        let sampler = PhotonSampler::new(16, 1, lit_map(Vector3f::Z_AXIS), 36, &mut RNG::new(1));
        let n = Vector3f::Z_AXIS;
        let (ru, rv) = coordinate_system(&n);
        assert_eq!(sampler.coords(&n, &n, &ru, &rv).0, 0);
        let (i, _) = sampler.coords(&ru, &n, &ru, &rv);
        assert_eq!(i, 3);
        let (_, j) = sampler.coords(&(ru * 0.1 - rv).normalize(), &n, &ru, &rv);
        assert_eq!(j, 6);
    }
}
