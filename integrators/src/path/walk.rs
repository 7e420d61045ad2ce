//! Hemisphere walks of the path light.

use super::*;

/// Irradiance hash cells are used directly when their normal is within this
/// cosine of the shading normal.
const HASH_NORMAL_COS: Float = 0.7;

/// Photons gathered from the irradiance map per lookup.
const IRRADIANCE_PHOTONS: usize = 5;

/// Minimum cosine between an irradiance photon and the shading normal.
const IRRADIANCE_MIN_COS: Float = 0.25;

/// Hemisphere integration result.
#[derive(Copy, Clone, Debug)]
pub(super) struct SampleEstimate {
    /// Average incoming light.
    pub color: Spectrum,

    /// Harmonic mean distance of the first hits.
    pub avg_dist: Float,

    /// Distance of the closest first hit.
    pub min_dist: Float,
}

/// Running sums of a hemisphere integration.
struct Tally {
    /// Sum of all contributions.
    total: Spectrum,

    /// First pass contributions split into four interleaved groups.
    subtotal: [Spectrum; 4],

    /// Whether the first pass is running.
    first: bool,

    /// Number of rays whose first hit is recorded.
    rays: Float,

    /// Sum of the inverse first hit distances.
    inv_dist_sum: Float,

    /// Closest first hit; 0 until something was hit.
    min_dist: Float,
}

impl Tally {
    fn new() -> Self {
        Self {
            total: Spectrum::ZERO,
            subtotal: [Spectrum::ZERO; 4],
            first: true,
            rays: 0.0,
            inv_dist_sum: 0.0,
            min_dist: 0.0,
        }
    }

    /// Add the contribution of sample `i`.
    fn add(&mut self, i: usize, contribution: Spectrum) {
        self.total += contribution;
        if self.first {
            self.subtotal[i % 4] += contribution;
        }
    }

    /// Record a first hit distance.
    fn record_hit(&mut self, z: Float) {
        if z > 0.0 {
            self.inv_dist_sum += 1.0 / z;
        }
        if z < self.min_dist || self.min_dist == 0.0 {
            self.min_dist = z;
        }
    }

    /// Number of extra passes needed judging by how much the four groups
    /// of the first pass disagree. Ends the first pass.
    ///
    /// * `multiplier` - Normalization of one group.
    /// * `scene`      - The scene.
    /// * `threshold`  - Noise threshold.
    fn extra_passes(&mut self, multiplier: Float, scene: &dyn Scene, threshold: Float) -> usize {
        self.first = false;
        let (lo, hi) = self
            .subtotal
            .iter()
            .map(|s| *s * multiplier)
            .fold((Spectrum::new(1000.0), Spectrum::ZERO), |(lo, hi), s| (lo.min(&s), hi.max(&s)));
        let lo = scene.adjust_color(&lo);
        let hi = scene.adjust_color(&hi);

        let ene = lo.max_abs_diff(&Spectrum::ZERO);
        let diff = hi.max_abs_diff(&lo) / (max(ene, 1.0) * 4.0) / threshold;
        clamp((diff * diff) as i64 - 1, 0, 3) as usize
    }
}

impl PathLight {
    /// Integrate the hemisphere around `n`. Light arriving along each path
    /// is looked up with `get_light` at every diffuse bounce. In occlusion
    /// mode only the unoccluded background is summed. When `caching` the
    /// first hit distances are tracked for the cache weights.
    ///
    /// * `data`    - Per-thread data.
    /// * `state`   - Render state.
    /// * `scene`   - The scene.
    /// * `sp`      - Surface point.
    /// * `n`       - Forward facing normal.
    /// * `caching` - Whether the estimate goes into the cache.
    pub(super) fn take_sample(
        &self,
        data: &mut ThreadData,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        n: &Vector3f,
        caching: bool,
    ) -> SampleEstimate {
        let max_dist = 1_000_000.0 * scene.world_resolution() * sp.z;
        let ThreadData {
            sampler, photon_radius, ..
        } = data;

        if self.options.direct {
            return SampleEstimate {
                color: self.get_light(photon_radius, state, scene, sp, n),
                avg_dist: max_dist,
                min_dist: max_dist,
            };
        }

        let old_division = state.ray_division;
        let old_skip = state.skip;
        state.ray_division = old_division * self.options.samples;
        sampler.sampling_from(state, &sp.p, n, &sp.nu, &sp.nv);

        let mut tally = Tally::new();
        let mut remaining = 1;
        let mut passes = 0;
        while remaining > 0 {
            sampler.reset();
            if self.options.occlusion {
                self.occlusion_pass(&mut **sampler, &mut tally, state, scene, sp, n, caching);
            } else {
                self.gi_pass(&mut **sampler, photon_radius, &mut tally, state, scene, sp, n, caching);
            }
            if tally.first {
                remaining += tally.extra_passes(sampler.multiplier(), scene, self.options.threshold);
            }
            remaining -= 1;
            passes += 1;
        }

        let (avg_dist, min_dist) = if caching {
            let avg = if tally.inv_dist_sum > 0.0 { tally.rays / tally.inv_dist_sum } else { max_dist };
            let min = if tally.min_dist <= 0.0 { max_dist } else { tally.min_dist };
            (avg, min)
        } else {
            (0.0, 0.0)
        };

        state.ray_division = old_division;
        state.skip = old_skip;
        SampleEstimate {
            color: tally.total * (sampler.multiplier() / passes as Float),
            avg_dist,
            min_dist,
        }
    }

    /// One pass of ambient occlusion samples.
    #[allow(clippy::too_many_arguments)]
    fn occlusion_pass(
        &self,
        sampler: &mut dyn HemiSampler,
        tally: &mut Tally,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        n: &Vector3f,
        caching: bool,
    ) {
        let max_distance = self.options.max_distance;
        let mut ray_color = Spectrum::ONE;
        state.skip = Some(sp.origin);

        for i in 0..self.options.samples {
            let dir = sampler.next_direction(&sp.p, n, &sp.nu, &sp.nv, i, 0, &mut ray_color);
            let open = if caching {
                tally.rays += 1.0;
                // Hits beyond the distance limit still count for the
                // occluder distances.
                match scene.first_hit(state, &sp.p, &dir, true) {
                    Some(hit) => {
                        tally.record_hit(hit.z);
                        max_distance > 0.0 && hit.z > max_distance
                    }
                    None => true,
                }
            } else if max_distance > 0.0 {
                !scene.is_shadowed(state, sp, &(sp.p + dir * max_distance))
            } else {
                !scene.is_shadowed_dir(state, sp, &dir)
            };

            if open {
                let contribution = scene.background(&dir, state, true) * dir.dot(n).abs();
                if caching {
                    tally.add(i, contribution);
                } else {
                    tally.total += contribution;
                }
            }
        }
    }

    /// One pass of diffuse paths.
    #[allow(clippy::too_many_arguments)]
    fn gi_pass(
        &self,
        sampler: &mut dyn HemiSampler,
        photon_radius: &mut Float,
        tally: &mut Tally,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        n: &Vector3f,
        caching: bool,
    ) {
        for i in 0..self.options.samples {
            let mut ray_color = Spectrum::ONE;
            let mut ray = sampler.next_direction(&sp.p, n, &sp.nu, &sp.nv, i, 0, &mut ray_color);
            let start_cos = ray.dot(n);
            let mut from = sp.p;
            if caching {
                tally.rays += 1.0;
            }
            state.skip = Some(sp.origin);

            let mut depth = 0;
            let mut caustic_steps = 0;
            while depth < self.options.depth {
                if ray_color.energy() < MIN_DIFFUSE_ENERGY {
                    break;
                }
                let hit = match scene.first_hit(state, &from, &ray, true) {
                    Some(hit) => hit,
                    None => {
                        tally.add(i, ray_color * scene.background(&ray, state, true) * start_cos);
                        break;
                    }
                };
                if caching && depth == 0 && caustic_steps == 0 {
                    tally.record_hit(hit.z);
                }

                let back = -ray;
                let light = self.get_light(photon_radius, state, scene, &hit, &back);
                tally.add(i, ray_color * light * start_cos);

                let normal = if self.options.ignore_bumpnormals && caching { hit.nd } else { hit.n };
                let facing = face_forward(&hit.ng, &normal, &back);
                if !follow_caustic(state, &mut ray, &mut ray_color, &normal, &facing, &hit.object) {
                    ray_color *= hit.shader.diffuse(state, &hit, &back);
                    ray = sampler.next_direction(&hit.p, &facing, &hit.nu, &hit.nv, i, depth + 1, &mut ray_color);
                    depth += 1;
                } else if caustic_steps < self.options.caus_depth {
                    caustic_steps += 1;
                } else {
                    depth += 1;
                }
                from = hit.p;
                state.skip = Some(hit.origin);
            }
        }
    }

    /// Light leaving `sp` towards `eye`: indirect-enabled lights, emission
    /// and, when the photon pre-pass published them, pre-integrated
    /// irradiance.
    ///
    /// * `photon_radius` - Irradiance map search radius; updated.
    /// * `state`         - Render state.
    /// * `scene`         - The scene.
    /// * `sp`            - Surface point.
    /// * `eye`           - Direction towards the viewer.
    pub(super) fn get_light(
        &self,
        photon_radius: &mut Float,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        eye: &Vector3f,
    ) -> Spectrum {
        let ready = self.cache.as_ref().map_or(false, |c| c.cache.ready());
        let normal = if self.options.ignore_bumpnormals && !ready { &sp.nd } else { &sp.n };
        let n = face_forward(&sp.ng, normal, eye);

        let maps = self.maps.load();
        let irradiance = match (&maps.irradiance_map, &maps.hash) {
            (Some(map), Some(hash)) => {
                gather_irradiance(map, hash, photon_radius, &sp.p, &n) * sp.shader.diffuse(state, sp, &n)
            }
            _ => Spectrum::ZERO,
        };

        irradiance
            + scene.light(state, sp, &(sp.p + *eye), true)
            + sp.shader.from_radiosity(state, sp, &Energy::new(n, Spectrum::ZERO), eye)
    }
}

/// Irradiance at `p`, from the hash cell when its normal agrees with `n`,
/// otherwise from the closest irradiance photons.
///
/// * `map`    - Irradiance photon map.
/// * `hash`   - Irradiance hash.
/// * `radius` - Search radius; updated.
/// * `p`      - Point.
/// * `n`      - Normal.
fn gather_irradiance(map: &PhotonMap, hash: &IrradianceHash, radius: &mut Float, p: &Point3f, n: &Vector3f) -> Spectrum {
    if let Some(cell) = hash.get(p) {
        let factor = cell.n.dot(n);
        if factor > HASH_NORMAL_COS {
            return cell.irr * factor;
        }
    }

    let mut found = Vec::with_capacity(IRRADIANCE_PHOTONS + 1);
    map.gather(p, n, &mut found, IRRADIANCE_PHOTONS, radius, IRRADIANCE_MIN_COS);
    let farthest = match found.as_slice() {
        [] => return Spectrum::ZERO,
        [_] => *radius,
        [f, ..] => f.dis,
    };
    let farthest = if farthest == 0.0 { 1.0 } else { farthest };

    let (total, div) = found.iter().fold((Spectrum::ZERO, 0.0), |(total, div), f| {
        let factor = f.photon.direction().dot(n) * (1.0 - f.dis / farthest);
        if factor > 0.0 {
            (total + f.photon.color * factor, div + factor)
        } else {
            (total, div)
        }
    });
    if div > 0.0 {
        total / div
    } else {
        total
    }
}

/// Continue a path through a specular interface. Picks reflection or
/// transmission at random in proportion to their Fresnel weighted colors.
/// Returns false if the object has no specular interface.
///
/// * `state`     - Render state.
/// * `ray`       - Incoming direction; replaced by the new one.
/// * `ray_color` - Path throughput; filtered.
/// * `n`         - Shading normal.
/// * `facing`    - Shading normal facing the incoming ray.
/// * `object`    - Object flags.
fn follow_caustic(
    state: &mut RenderState,
    ray: &mut Vector3f,
    ray_color: &mut Spectrum,
    n: &Vector3f,
    facing: &Vector3f,
    object: &ObjectProperties,
) -> bool {
    let caustic = match object.caustic {
        Some(caustic) => caustic,
        None => return false,
    };
    let edir = -*ray;
    let (kr, kt) = fresnel(&edir, n, caustic.ior);
    let reflected = caustic.reflect * kr;
    let transmitted = caustic.transmit * kt;
    let p_reflect = reflected.r() + reflected.g() + reflected.b();
    let p_transmit = transmitted.r() + transmitted.g() + transmitted.b();
    if p_reflect == 0.0 && p_transmit == 0.0 {
        return false;
    }

    if p_reflect / (p_reflect + p_transmit) > state.random() {
        *ray = reflect(facing, &edir);
        *ray_color *= reflected;
    } else {
        *ray = refract(n, &edir, caustic.ior);
        *ray_color *= transmitted;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn first_pass_agreement_needs_no_extra_passes() {
        let scene = SimpleScene::new(Spectrum::ZERO);
        let mut tally = Tally::new();
        for i in 0..8 {
            tally.add(i, Spectrum::new(0.5));
        }
        assert_eq!(tally.extra_passes(0.5, &scene, 0.1), 0);
        assert!(!tally.first);

        tally.add(0, Spectrum::ONE);
        assert_eq!(tally.subtotal[0], Spectrum::new(1.0));
    }

    #[test]
    fn noisy_first_pass_caps_extra_passes() {
        let scene = SimpleScene::new(Spectrum::ZERO);
        let mut tally = Tally::new();
        tally.add(0, Spectrum::new(4.0));
        assert_eq!(tally.extra_passes(1.0, &scene, 0.1), 3);
    }

    #[test]
    fn hit_distances() {
        let mut tally = Tally::new();
        tally.record_hit(2.0);
        tally.record_hit(0.5);
        tally.record_hit(4.0);
        assert!(approx_eq!(Float, tally.inv_dist_sum, 2.75, epsilon = 1e-6));
        assert_eq!(tally.min_dist, 0.5);
    }

    #[test]
    fn opaque_objects_do_not_bend_paths() {
        let mut state = RenderState::new(RNG::new(4));
        let mut ray = -Vector3f::Z_AXIS;
        let mut color = Spectrum::ONE;
        let n = Vector3f::Z_AXIS;
        let object = ObjectProperties::default();
        assert!(!follow_caustic(&mut state, &mut ray, &mut color, &n, &n, &object));
        assert_eq!(ray, -Vector3f::Z_AXIS);
        assert_eq!(color, Spectrum::ONE);
    }

    #[test]
    fn mirrors_reflect() {
        let mut state = RenderState::new(RNG::new(5));
        let mut ray = Vector3f::new(1.0, 0.0, -1.0).normalize();
        let mut color = Spectrum::ONE;
        let n = Vector3f::Z_AXIS;
        let object = ObjectProperties {
            caustic: Some(Caustic {
                reflect: Spectrum::new(0.9),
                transmit: Spectrum::ZERO,
                ior: 1.5,
            }),
            ..ObjectProperties::default()
        };
        assert!(follow_caustic(&mut state, &mut ray, &mut color, &n, &n, &object));
        assert!(approx_eq!(Float, ray.x, INV_SQRT_2, epsilon = 1e-5));
        assert!(approx_eq!(Float, ray.z, INV_SQRT_2, epsilon = 1e-5));
        assert!(color.r() > 0.0 && color.r() < 0.9);
    }

    #[test]
    fn empty_irradiance_map_gives_nothing() {
        let mut map = PhotonMap::new(1.0);
        map.build_tree();
        let hash = IrradianceHash::new(0.1);
        let mut radius = 0.0;
        let c = gather_irradiance(&map, &hash, &mut radius, &Point3f::ORIGIN, &Vector3f::Z_AXIS);
        assert!(c.is_black());
        assert_eq!(radius, 1.0);
    }

    #[test]
    fn agreeing_hash_cell_is_used_directly() {
        let mut map = PhotonMap::new(1.0);
        map.build_tree();
        let mut hash = IrradianceHash::new(0.1);
        let cell = hash.find_box(&Point3f::ORIGIN);
        cell.n = Vector3f::Z_AXIS;
        cell.irr = Spectrum::new(0.6);
        let mut radius = 0.0;
        let c = gather_irradiance(&map, &hash, &mut radius, &Point3f::ORIGIN, &Vector3f::Z_AXIS);
        assert!(approx_eq!(Float, c.r(), 0.6, epsilon = 1e-6));
    }
}
