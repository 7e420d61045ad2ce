//! Global Photon Light

use accelerators::*;
use arc_swap::ArcSwapOption;
use photon_core::geometry::*;
use photon_core::light::*;
use photon_core::paramset::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::rng::*;
use photon_core::sampling::*;
use photon_core::scene::*;
use photon_core::spectrum::*;
use std::sync::Arc;

/// Registry name of the photon map.
pub const GLOBAL_PHOTON_MAP: &str = "globalPhotonMap";

/// Registry name of the pre-integrated irradiance map.
pub const IRRADIANCE_PHOTON_MAP: &str = "irradianceGlobalPhotonMap";

/// Registry name of the irradiance hash.
pub const IRRADIANCE_HASH_MAP: &str = "irradianceHashMap";

/// Cosine of the cone used for diffuse photon bounces.
const BOUNCE_CONE_COS: Float = 0.05;

/// A hash cell merging every photon that landed in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct IrradiancePhoton {
    /// Merged photon. Its direction is absent while the cell is empty.
    pub photon: StoredPhoton,

    /// Surface normal of the first photon stored in the cell.
    pub n: Vector3f,

    /// Pre-integrated irradiance.
    pub irr: Spectrum,
}

/// Sparse grid of merged photons.
pub type IrradianceHash = Hash3D<IrradiancePhoton>;

/// Maps built by a `GlobalPhotonLight`.
#[derive(Clone)]
pub struct PhotonArtifacts {
    /// Stored photons.
    pub photon_map: Arc<PhotonMap>,

    /// One pre-integrated entry per hash cell.
    pub irradiance_map: Arc<PhotonMap>,

    /// Merged photons with their irradiance.
    pub hash: Arc<IrradianceHash>,
}

/// Photon tracing pre-pass. Shoots photons from every emitting light,
/// bounces them through the scene and publishes the resulting maps for the
/// final gather.
pub struct GlobalPhotonLight {
    /// Maximum gather radius.
    radius: Float,

    /// Maximum number of diffuse bounces.
    max_depth: usize,

    /// Maximum number of caustic transmissions.
    max_caus_depth: usize,

    /// Total photon budget.
    num_photons: usize,

    /// Number of photons used for pre-integration.
    search: usize,

    /// Maps built by `init`.
    artifacts: ArcSwapOption<PhotonArtifacts>,
}

impl GlobalPhotonLight {
    /// Returns a new `GlobalPhotonLight`.
    ///
    /// * `radius`         - Maximum gather radius.
    /// * `max_depth`      - Maximum number of diffuse bounces.
    /// * `max_caus_depth` - Maximum number of caustic transmissions.
    /// * `num_photons`    - Total photon budget.
    /// * `search`         - Number of photons used for pre-integration.
    pub fn new(radius: Float, max_depth: usize, max_caus_depth: usize, num_photons: usize, search: usize) -> Self {
        Self {
            radius,
            max_depth,
            max_caus_depth,
            num_photons,
            search: search.max(1),
            artifacts: ArcSwapOption::empty(),
        }
    }

    /// Returns the maps built by the last `init`.
    pub fn artifacts(&self) -> Option<Arc<PhotonArtifacts>> {
        self.artifacts.load_full()
    }

    /// Cell size of the irradiance hash.
    fn hash_cell_size(&self) -> Float {
        self.radius / (self.search as Float).sqrt()
    }

    /// Trace a photon until it is absorbed or exceeds the bounce limits.
    ///
    /// * `scene`       - The scene.
    /// * `state`       - Render state used for intersection queries.
    /// * `photon`      - The photon.
    /// * `dir`         - Initial direction.
    /// * `store_first` - Whether the first hit is stored.
    /// * `photon_map`  - Map receiving stored photons.
    /// * `hash`        - Hash receiving stored photons.
    #[allow(clippy::too_many_arguments)]
    fn shoot(
        &self,
        scene: &dyn Scene,
        state: &mut RenderState,
        mut photon: RunningPhoton,
        mut dir: Vector3f,
        store_first: bool,
        photon_map: &mut PhotonMap,
        hash: &mut IrradianceHash,
    ) {
        let mut depth = 0;
        let mut caus_depth = 0;
        state.skip = None;

        while depth <= self.max_depth {
            let sp = match scene.first_hit(state, &photon.pos(), &dir, false) {
                Some(sp) => sp,
                None => return,
            };
            state.skip = Some(sp.origin);
            photon.position(sp.p, MIN_RAYDIST);

            let edir = (photon.last_pos() - photon.pos()).normalize_or_zero();
            let n = face_forward(&sp.ng, &sp.n, &edir);
            let ng = face_forward(&sp.ng, &sp.ng, &edir);

            if (depth > 0 || store_first) && sp.object.receive_radiosity {
                let stored = StoredPhoton::from(&photon);
                photon_map.store(stored);
                store_in_hash(hash, &stored, &n);
            }

            let caustic = sp.object.caustic.filter(|_| caus_depth < self.max_caus_depth);
            let mut trans = caustic.map_or(0.0, |c| c.transmit.energy());
            let diff_color = if sp.object.use_for_radiosity {
                sp.shader.diffuse(state, &sp, &edir)
            } else {
                Spectrum::ZERO
            };
            let mut diffuse = diff_color.energy();

            let sum = trans + diffuse;
            if sum <= 0.0 {
                return;
            }
            trans /= sum;
            diffuse /= sum;

            match caustic {
                Some(c) if state.random() < trans => {
                    photon.filter(&(c.transmit / trans));
                    dir = refract(&sp.n, &-dir, c.ior);
                    caus_depth += 1;
                }
                _ => {
                    let r1 = state.random();
                    let r2 = state.random();
                    photon.filter(&(diff_color / diffuse));
                    dir = uniform_sample_cone(&ng, &sp.nu, &sp.nv, BOUNCE_CONE_COS, r1, r2);
                    depth += 1;
                }
            }
        }
    }

    /// Pre-integrate the irradiance of every hash cell and build the map of
    /// pre-integrated entries.
    ///
    /// * `hash` - The irradiance hash.
    fn compute_irradiances(&self, hash: &mut IrradianceHash) -> PhotonMap {
        let mut merged = PhotonMap::new(self.radius);
        for (_, cell) in hash.iter() {
            if cell.photon.has_direction() {
                merged.store(cell.photon);
            }
        }
        merged.build_tree();

        let mut found = Vec::with_capacity(self.search + 1);
        let mut radius = merged.max_radius();
        for (_, cell) in hash.iter_mut() {
            if cell.photon.has_direction() {
                merged.gather(&cell.photon.pos, &cell.n, &mut found, self.search, &mut radius, 0.0);
                cell.irr = pre_integrate(&found, &cell.n);
            }
        }

        let mut irradiance = PhotonMap::new(self.radius);
        for (_, cell) in hash.iter_mut() {
            if cell.photon.has_direction() {
                cell.photon.set_direction(&cell.n);
                cell.photon.color = cell.irr;
                irradiance.store(cell.photon);
            }
        }
        irradiance.build_tree();
        irradiance
    }
}

/// Merge a stored photon into the hash cell containing it.
///
/// * `hash`   - The irradiance hash.
/// * `photon` - The photon.
/// * `n`      - Face-forwarded surface normal at the photon.
fn store_in_hash(hash: &mut IrradianceHash, photon: &StoredPhoton, n: &Vector3f) {
    let cell = hash.find_box(&photon.pos);
    if !cell.photon.has_direction() {
        cell.photon = *photon;
        cell.n = *n;
    } else if photon.direction().dot(&cell.n) > 0.0 {
        let mixed = cell.photon.direction() * cell.photon.color.energy() + photon.direction() * photon.color.energy();
        cell.photon.set_direction(&mixed.normalize_or_zero());
        cell.photon.color += photon.color;
    }
}

/// Density estimate of the irradiance at a cell from its merged
/// neighbours, farthest first.
///
/// * `found` - Gathered photons, farthest first.
/// * `n`     - Cell normal.
fn pre_integrate(found: &[FoundPhoton], n: &Vector3f) -> Spectrum {
    let farthest = match found.first() {
        None => return Spectrum::ZERO,
        Some(f) => f,
    };
    if found.len() == 1 || farthest.dis == 0.0 {
        let factor = max(0.0, farthest.photon.direction().dot(n));
        return farthest.photon.color * factor;
    }

    let total = found.iter().fold(Spectrum::ZERO, |total, f| {
        let factor = (1.0 - f.dis / farthest.dis) * f.photon.direction().dot(n);
        if factor > 0.0 {
            total + f.photon.color * factor
        } else {
            total
        }
    });
    let area = max(PI * farthest.dis * farthest.dis, MIN_RAYDIST);
    total * (FOUR_PI / area)
}

impl Light for GlobalPhotonLight {
    fn illuminate(&self, _state: &mut RenderState, _scene: &dyn Scene, _sp: &SurfacePoint, _eye: &Vector3f) -> Spectrum {
        Spectrum::ZERO
    }

    fn init(&self, scene: &dyn Scene) {
        let mut emitters: Vec<Box<dyn Emitter>> = scene
            .lights()
            .iter()
            .filter_map(|l| l.emitter(self.num_photons))
            .collect();
        if emitters.is_empty() {
            warn!("No photon emitting lights; skipping photon tracing");
            return;
        }

        let photons_per_light = self.num_photons / emitters.len();
        let mut photon_map = PhotonMap::new(self.radius);
        let mut hash = IrradianceHash::new(self.hash_cell_size());
        let mut state = RenderState::new(RNG::unique());

        for emitter in emitters.iter_mut() {
            let store_first = emitter.store_direct();
            emitter.num_samples(photons_per_light);
            for i in 0..photons_per_light {
                let (from, dir, color) = emitter.get_direction(i, &mut state.rng);
                let photon = RunningPhoton::new(color, from);
                self.shoot(scene, &mut state, photon, dir, store_first, &mut photon_map, &mut hash);
            }
        }
        info!("Shot {} photons from each light of {}", photons_per_light, emitters.len());

        photon_map.build_tree();
        info!("Stored {}", photon_map.count());

        info!("Pre-gathering ...");
        let irradiance_map = self.compute_irradiances(&mut hash);
        info!("Pre-gathered {} irradiance entries", irradiance_map.count());

        let artifacts = PhotonArtifacts {
            photon_map: Arc::new(photon_map),
            irradiance_map: Arc::new(irradiance_map),
            hash: Arc::new(hash),
        };
        let registry = scene.registry();
        registry.publish(GLOBAL_PHOTON_MAP, Arc::clone(&artifacts.photon_map));
        registry.publish(IRRADIANCE_PHOTON_MAP, Arc::clone(&artifacts.irradiance_map));
        registry.publish(IRRADIANCE_HASH_MAP, Arc::clone(&artifacts.hash));
        self.artifacts.store(Some(Arc::new(artifacts)));
    }
}

impl From<&ParamSet> for GlobalPhotonLight {
    /// Create a `GlobalPhotonLight` from given parameter set.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let radius = params.find_one_float("radius", 1.0);
        let max_depth = params.find_one_int("depth", 2);
        let max_caus_depth = params.find_one_int("caus_depth", 4);
        let photons = params.find_one_int("photons", 50000);
        let search = params.find_one_int("search", 200);
        Self::new(
            radius,
            max(max_depth, 0) as usize,
            max(max_caus_depth, 0) as usize,
            max(photons, 0) as usize,
            max(search, 1) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointLight;
    use photon_core::shader::*;

    /// Floor and ceiling facing each other with a point light in between.
    fn lit_room(light: GlobalPhotonLight) -> (SimpleScene, Arc<GlobalPhotonLight>) {
        let mut scene = SimpleScene::new(Spectrum::ZERO);
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.7), Spectrum::ZERO));
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-10.0, -10.0, 0.0),
                edge_u: Vector3f::new(20.0, 0.0, 0.0),
                edge_v: Vector3f::new(0.0, 20.0, 0.0),
            },
            ObjectProperties::default(),
            Arc::clone(&shader),
        );
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-10.0, -10.0, 2.0),
                edge_u: Vector3f::new(0.0, 20.0, 0.0),
                edge_v: Vector3f::new(20.0, 0.0, 0.0),
            },
            ObjectProperties::default(),
            shader,
        );
        let photon_light = Arc::new(light);
        scene.add_light(Arc::new(PointLight::new(Point3f::new(0.0, 0.0, 1.0), Spectrum::ONE, 10.0, true)));
        scene.add_light(Arc::clone(&photon_light) as ArcLight);
        (scene, photon_light)
    }

    #[test]
    fn defaults_from_params() {
        let light = GlobalPhotonLight::from(&ParamSet::new());
        assert_eq!(light.radius, 1.0);
        assert_eq!(light.max_depth, 2);
        assert_eq!(light.max_caus_depth, 4);
        assert_eq!(light.num_photons, 50000);
        assert_eq!(light.search, 200);
        assert!((light.hash_cell_size() - 1.0 / 200.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn no_emitters_is_a_no_op() {
        let scene = SimpleScene::new(Spectrum::ZERO);
        let light = GlobalPhotonLight::new(1.0, 2, 4, 100, 10);
        light.init(&scene);
        assert!(light.artifacts().is_none());
        assert!(scene.registry().get::<PhotonMap>(GLOBAL_PHOTON_MAP).is_none());
    }

    #[test]
    fn store_in_hash_merges_facing_photons() {
        let mut hash = IrradianceHash::new(1.0);
        let n = Vector3f::Z_AXIS;
        let p = Point3f::new(0.5, 0.5, 0.0);
        let a = StoredPhoton::new(p, Spectrum::ONE, &Vector3f::new(0.6, 0.0, 0.8));
        let b = StoredPhoton::new(p, Spectrum::ONE, &Vector3f::new(-0.6, 0.0, 0.8));
        let c = StoredPhoton::new(p, Spectrum::ONE, &Vector3f::new(0.0, 0.0, -1.0));
        store_in_hash(&mut hash, &a, &n);
        store_in_hash(&mut hash, &b, &n);
        store_in_hash(&mut hash, &c, &n);

        let cell = hash.get(&p).unwrap();
        assert_eq!(cell.photon.color, Spectrum::new(2.0));
        assert_eq!(cell.n, n);
        assert!(cell.photon.direction().z > 0.99);
    }

    #[test]
    fn pre_integrate_degenerate_cases() {
        let n = Vector3f::Z_AXIS;
        assert_eq!(pre_integrate(&[], &n), Spectrum::ZERO);

        let photon = StoredPhoton::new(Point3f::ORIGIN, Spectrum::new(2.0), &n);
        let single = [FoundPhoton { photon: &photon, dis: 0.3 }];
        assert_eq!(pre_integrate(&single, &n), Spectrum::new(2.0));

        let away = StoredPhoton::new(Point3f::ORIGIN, Spectrum::new(2.0), &-n);
        let single = [FoundPhoton { photon: &away, dis: 0.0 }];
        assert_eq!(pre_integrate(&single, &n), Spectrum::ZERO);
    }

    #[test]
    fn diffuse_floor_gathers_search_photons() {
        let (scene, light) = lit_room(GlobalPhotonLight::new(3.0, 2, 4, 1000, 50));
        light.init(&scene);

        let artifacts = light.artifacts().unwrap();
        let photon_map = scene.registry().get::<PhotonMap>(GLOBAL_PHOTON_MAP).unwrap();
        assert!(Arc::ptr_eq(&photon_map, &artifacts.photon_map));
        assert!(scene.registry().get::<PhotonMap>(IRRADIANCE_PHOTON_MAP).is_some());
        assert!(scene.registry().get::<IrradianceHash>(IRRADIANCE_HASH_MAP).is_some());

        // First hits are not stored; bounces between floor and ceiling are.
        assert!(photon_map.count() > 500);

        let mut found = vec![];
        let mut radius = photon_map.max_radius();
        photon_map.gather(&Point3f::ORIGIN, &Vector3f::Z_AXIS, &mut found, 50, &mut radius, 0.0);
        assert_eq!(found.len(), 50);
        assert!(found.iter().all(|f| f.photon.direction().dot(&Vector3f::Z_AXIS) > 0.0));
        assert!(found.iter().all(|f| f.dis <= radius / 0.95));

        let irradiance = &artifacts.irradiance_map;
        assert_eq!(irradiance.count(), artifacts.hash.iter().filter(|(_, c)| c.photon.has_direction()).count());
        assert!(irradiance.photons().iter().all(|p| p.direction().z.abs() > 0.99));
        assert!(irradiance.photons().iter().any(|p| !p.color.is_black()));
    }

    #[test]
    fn first_hit_is_not_stored_for_direct_emitters() {
        // With depth 0 only first hits happen and those are never stored.
        let (scene, light) = lit_room(GlobalPhotonLight::new(1.0, 0, 4, 200, 10));
        light.init(&scene);
        assert_eq!(light.artifacts().unwrap().photon_map.count(), 0);
    }
}
