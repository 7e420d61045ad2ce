//! Path Light

use crate::cache_proxy::*;
use crate::light_cache::*;
use accelerators::*;
use arc_swap::ArcSwap;
use photon_core::error::*;
use photon_core::geometry::*;
use photon_core::light::*;
use photon_core::parallel::*;
use photon_core::paramset::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::rng::*;
use photon_core::scene::*;
use photon_core::shader::*;
use photon_core::spectrum::*;
use lights::*;
use samplers::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod refinement;
mod walk;

/// Points whose diffuse color is dimmer than this are not sampled.
const MIN_DIFFUSE_ENERGY: Float = 0.05;

/// Sample counts above this use photon importance sampling when a photon
/// map is available.
const PHOTON_SAMPLER_THRESHOLD: usize = 96;

/// Construction options of a `PathLight`.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLightOptions {
    /// Hemisphere samples per shading point.
    pub samples: usize,

    /// Scale of the returned light.
    pub power: Float,

    /// Maximum number of diffuse bounces.
    pub depth: usize,

    /// Maximum number of caustic bounces per diffuse bounce.
    pub caus_depth: usize,

    /// Use Halton sequences.
    pub use_qmc: bool,

    /// Use the irradiance cache.
    pub cache: bool,

    /// Cache cell size in cache space.
    pub cache_size: Float,

    /// Noise level that triggers extra samples and refinement.
    pub threshold: Float,

    /// Inverse of the weight a cached sample must reach.
    pub shadow_threshold: Float,

    /// Number of cached samples used for interpolation.
    pub search: usize,

    /// Accepted for scene compatibility; cached samples are always
    /// recomputed.
    pub recalculate: bool,

    /// Return the first bounce light without sampling.
    pub direct: bool,

    /// Render cache sample positions instead of light.
    pub show_samples: bool,

    /// Number of hemisphere sectors of the photon sampler.
    pub grid: usize,

    /// Maximum number of refinement passes.
    pub max_refinement: usize,

    /// Compute ambient occlusion instead of global illumination.
    pub occlusion: bool,

    /// Occlusion distance limit; non-positive means unlimited.
    pub max_distance: Float,

    /// Use the unperturbed normal while caching.
    pub ignore_bumpnormals: bool,
}

impl Default for PathLightOptions {
    fn default() -> Self {
        Self {
            samples: 16,
            power: 1.0,
            depth: 3,
            caus_depth: 4,
            use_qmc: false,
            cache: false,
            cache_size: 0.01,
            threshold: 0.1,
            shadow_threshold: 0.1,
            search: 9,
            recalculate: true,
            direct: false,
            show_samples: false,
            grid: 36,
            max_refinement: 2,
            occlusion: false,
            max_distance: -1.0,
            ignore_bumpnormals: false,
        }
    }
}

impl From<&ParamSet> for PathLightOptions {
    /// Read `PathLightOptions` from a parameter set.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let defaults = Self::default();

        let mut samples = params.find_one_int("samples", 16);
        if samples < 1 {
            warn!("Samples value too low, minimum is one");
            samples = 1;
        }
        let mut samples = samples as usize;
        let use_qmc = params.find_one_bool("use_QMC", false);
        if !use_qmc {
            let (square, _) = floor_square(samples);
            if square != samples {
                info!("Samples value changed from {} to {}", samples, square);
                samples = square;
            }
        }

        let cache = params.find_one_bool("cache", false);
        let mode = params.find_one_string("mode", String::new());

        let mut options = Self {
            samples,
            power: params.find_one_float("power", defaults.power),
            depth: max(params.find_one_int("depth", 3), 0) as usize,
            caus_depth: max(params.find_one_int("caus_depth", 4), 0) as usize,
            use_qmc,
            cache,
            threshold: params.find_one_float("threshold", defaults.threshold),
            direct: params.find_one_bool("direct", false),
            grid: max(params.find_one_int("grid", 36), 1) as usize,
            max_refinement: max(params.find_one_int("max_refinement", 2), 0) as usize,
            occlusion: mode == "occlusion",
            max_distance: params.find_one_float("maxdistance", defaults.max_distance),
            ..defaults
        };

        if cache {
            options.cache_size = params.find_one_float("cache_size", 0.01);
            options.shadow_threshold = params.find_one_float("shadow_threshold", 0.3);
            options.search = max(params.find_one_int("search", 50), 3) as usize;
            options.recalculate = params.find_one_bool("recalculate", true);
            options.show_samples = params.find_one_bool("show_samples", false);
            options.ignore_bumpnormals = params.find_one_bool("ignore_bumpnormals", false);
        }
        options
    }
}

/// Cache related settings derived from the options.
struct CacheSettings {
    /// The cache.
    cache: Arc<LightCache>,

    /// Weight a cached sample must reach to make a new one unnecessary.
    desired_weight: Float,

    /// Weight separating poor from good samples.
    weight_limit: Float,

    /// Maximum interpolation radius.
    search_radius: Float,

    /// Spacing of samples when they are displayed.
    dist_to_sample: Float,

    /// Number of samples used for interpolation.
    search: usize,
}

impl CacheSettings {
    /// Returns the interpolation gather around a point. Rays below the first
    /// level keep up to three poorly weighted samples rather than none.
    ///
    /// * `state` - Render state.
    /// * `p`     - World position.
    /// * `polar` - Cache-space position.
    /// * `n`     - Forward facing normal.
    fn interpolation_query(&self, state: &RenderState, p: Point3f, polar: Point3f, n: Vector3f) -> GatherQuery {
        GatherQuery {
            p,
            polar,
            n,
            k: self.search,
            max_radius: self.search_radius,
            minimum: if state.ray_level > 0 { 3 } else { 0 },
            weight: SampleWeight::INTERPOLATE,
            weight_limit: self.weight_limit,
        }
    }
}

/// Maps published by the photon pre-pass.
#[derive(Default)]
struct GatherMaps {
    /// Stored photons; drives importance sampling.
    photon_map: Option<Arc<PhotonMap>>,

    /// Pre-integrated irradiance.
    irradiance_map: Option<Arc<PhotonMap>>,

    /// Irradiance by hash cell.
    hash: Option<Arc<IrradianceHash>>,
}

/// Per-thread scratch data.
struct ThreadData {
    /// Hemisphere sampler.
    sampler: BoxedHemiSampler,

    /// Cache front end, created on first interpolation.
    proxy: Option<CacheProxy>,

    /// Irradiance map search radius carried between gathers.
    photon_radius: Float,
}

/// Monte Carlo final gather over the hemisphere of every shaded point.
/// Optionally caches the results and interpolates between cached samples,
/// refining the cache over several preparatory passes.
pub struct PathLight {
    /// Options.
    options: PathLightOptions,

    /// Cache settings when caching.
    cache: Option<CacheSettings>,

    /// Key of the per-thread data in the render state context.
    owner: usize,

    /// Devaluation applied to samples flagged by refinement.
    devaluated: AtomicFloat,

    /// Number of refinement passes done.
    refined: AtomicUsize,

    /// Maps fetched in `init`.
    maps: ArcSwap<GatherMaps>,
}

impl PathLight {
    /// Create a new `PathLight`. With caching enabled the light cache is
    /// claimed from `registry`.
    ///
    /// * `options`  - Options.
    /// * `registry` - Cache registry.
    pub fn new(options: PathLightOptions, registry: &CacheRegistry) -> Result<Self> {
        let cache = if options.cache {
            let desired_weight = 1.0 / options.shadow_threshold;
            Some(CacheSettings {
                cache: registry.claim(options.cache_size)?,
                desired_weight,
                weight_limit: 0.8 * desired_weight,
                search_radius: 2.0 * options.cache_size,
                dist_to_sample: 0.1 * options.cache_size,
                search: options.search,
            })
        } else {
            None
        };

        Ok(Self {
            options,
            cache,
            owner: next_context_owner(),
            devaluated: AtomicFloat::new(1.0),
            refined: AtomicUsize::new(0),
            maps: ArcSwap::from_pointee(GatherMaps::default()),
        })
    }

    /// Returns the options.
    pub fn options(&self) -> &PathLightOptions {
        &self.options
    }

    /// Returns the light cache when caching.
    pub fn light_cache(&self) -> Option<&Arc<LightCache>> {
        self.cache.as_ref().map(|c| &c.cache)
    }

    /// Returns the devaluation applied by the next refinement.
    pub fn devaluated(&self) -> Float {
        self.devaluated.load()
    }

    /// Run `f` with this light's per-thread data, creating it on first use.
    ///
    /// * `state` - Render state.
    /// * `f`     - Function.
    fn with_thread_data<R, F>(&self, state: &mut RenderState, f: F) -> R
    where
        F: FnOnce(&mut ThreadData, &mut RenderState) -> R,
    {
        let mut data = match state.context.take::<ThreadData>(self.owner) {
            Some(data) => data,
            None => Box::new(self.new_thread_data(state)),
        };
        let result = f(&mut *data, state);
        state.context.store(self.owner, data);
        result
    }

    /// Pick the sampler for a new thread.
    ///
    /// * `state` - Render state.
    fn new_thread_data(&self, state: &mut RenderState) -> ThreadData {
        let maps = self.maps.load();
        let o = &self.options;
        let sampler: BoxedHemiSampler = match &maps.photon_map {
            Some(map) if o.samples > PHOTON_SAMPLER_THRESHOLD => Box::new(PhotonSampler::new(
                o.samples,
                o.depth,
                Arc::clone(map),
                o.grid,
                &mut state.rng,
            )),
            _ if o.use_qmc => Box::new(HaltonSampler::new(o.depth)),
            _ => Box::new(JitteredSampler::new(o.samples, RNG::new(state.rng.uniform_u32() as u64))),
        };
        ThreadData {
            sampler,
            proxy: None,
            photon_radius: 0.0,
        }
    }

    /// Integrate without the cache.
    ///
    /// * `state` - Render state.
    /// * `scene` - The scene.
    /// * `sp`    - Surface point.
    /// * `eye`   - Direction towards the viewer.
    fn normal_sample(&self, state: &mut RenderState, scene: &dyn Scene, sp: &SurfacePoint, eye: &Vector3f) -> Spectrum {
        let n = face_forward(&sp.ng, &sp.n, eye);
        let diffuse = sp.shader.diffuse(state, sp, eye);
        if diffuse.energy() < MIN_DIFFUSE_ENERGY {
            return Spectrum::ZERO;
        }
        let estimate = self.with_thread_data(state, |data, state| self.take_sample(data, state, scene, sp, &n, false));
        diffuse * estimate.color * self.options.power
    }

    /// Fill pass: sample the point unless the cache already covers it.
    /// Returns white where a sample was taken.
    ///
    /// * `c`     - Cache settings.
    /// * `state` - Render state.
    /// * `scene` - The scene.
    /// * `sp`    - Surface point.
    /// * `eye`   - Direction towards the viewer.
    fn cached(
        &self,
        c: &CacheSettings,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        eye: &Vector3f,
    ) -> Spectrum {
        if sp.shader.diffuse(state, sp, eye).energy() < MIN_DIFFUSE_ENERGY {
            return Spectrum::ZERO;
        }
        let normal = if self.options.ignore_bumpnormals && !c.cache.ready() { &sp.nd } else { &sp.n };
        let n = face_forward(&sp.ng, normal, eye);

        let desired = c.desired_weight / (state.ray_level + 1) as Float;
        if c.cache.enough_for(&sp.p, &n, state, SampleWeight::SUFFICIENCY, desired) {
            return Spectrum::ZERO;
        }

        let estimate = self.with_thread_data(state, |data, state| self.take_sample(data, state, scene, sp, &n, true));
        c.cache.insert(LightSample::new(
            n,
            estimate.color,
            estimate.avg_dist,
            sp.p,
            c.cache.to_polar(state),
            estimate.min_dist,
            state.traveled * scene.world_resolution(),
            self.devaluated.load(),
        ));
        Spectrum::ONE
    }

    /// Final pass: interpolate cached samples, sampling locally on a miss.
    ///
    /// * `c`     - Cache settings.
    /// * `state` - Render state.
    /// * `scene` - The scene.
    /// * `sp`    - Surface point.
    /// * `eye`   - Direction towards the viewer.
    fn interpolate(
        &self,
        c: &CacheSettings,
        state: &mut RenderState,
        scene: &dyn Scene,
        sp: &SurfacePoint,
        eye: &Vector3f,
    ) -> Spectrum {
        let diffuse = sp.shader.diffuse(state, sp, eye);
        if diffuse.energy() < MIN_DIFFUSE_ENERGY {
            return Spectrum::ZERO;
        }
        let normal = if self.options.ignore_bumpnormals { &sp.nd } else { &sp.n };
        let n = face_forward(&sp.ng, normal, eye);
        let polar = c.cache.to_polar(state);

        if self.options.show_samples {
            let mut radius = c.dist_to_sample * 0.5;
            let query = GatherQuery {
                p: sp.p,
                polar,
                n,
                k: 1,
                max_radius: radius,
                minimum: 0,
                weight: SampleWeight::INTERPOLATE,
                weight_limit: c.weight_limit,
            };
            let mut found = vec![];
            c.cache.gather_samples(&query, &mut radius, &mut found);
            return if found.is_empty() { Spectrum::ZERO } else { Spectrum::ONE };
        }

        let query = c.interpolation_query(state, sp.p, polar, n);

        self.with_thread_data(state, |data, state| {
            let mut proxy = data.proxy.take().unwrap_or_else(|| CacheProxy::new(c.search_radius));
            let mut found = Vec::with_capacity(c.search + 1);
            proxy.gather_samples(&c.cache, state, &query, &mut found);

            let neighbours: Vec<Neighbour> = found
                .iter()
                .map(|f| Neighbour {
                    weight: f.weight,
                    dis: f.dis,
                    color: f.sample.color,
                })
                .collect();
            let color = match blend(&neighbours, c.weight_limit, c.search_radius) {
                Some(color) => color,
                None => {
                    debug!("Cache miss at pixel {}", state.pixel);
                    let estimate = self.take_sample(data, state, scene, sp, &n, true);
                    proxy.add_sample(LightSample::new(
                        n,
                        estimate.color,
                        estimate.avg_dist,
                        sp.p,
                        polar,
                        estimate.min_dist,
                        state.traveled * scene.world_resolution(),
                        1.0,
                    ));
                    estimate.color
                }
            };
            data.proxy = Some(proxy);
            diffuse * color * self.options.power
        })
    }
}

/// A gathered sample reduced to what blending needs.
#[derive(Copy, Clone, Debug)]
struct Neighbour {
    /// Weight at the query.
    weight: Float,

    /// Cache-space distance to the query.
    dis: Float,

    /// Color.
    color: Spectrum,
}

/// Weighted average of gathered samples, weakest first. Weights are
/// lowered by the weakest weight, capped at `weight_limit`, and fade out
/// towards `search_radius`. Returns `None` when the weights sum to zero.
///
/// * `found`         - Samples, weakest first.
/// * `weight_limit`  - Weight separating poor from good samples.
/// * `search_radius` - Maximum search radius.
fn blend(found: &[Neighbour], weight_limit: Float, search_radius: Float) -> Option<Spectrum> {
    let floor = match found {
        [] | [_] => 0.0,
        [weakest, ..] => min(weakest.weight, weight_limit),
    };
    let (total, amount) = found.iter().fold((Spectrum::ZERO, 0.0), |(total, amount), f| {
        let w = (f.weight - floor) * (1.0 - f.dis / search_radius);
        (total + f.color * w, amount + w)
    });
    if amount != 0.0 {
        Some(total / amount)
    } else {
        None
    }
}

impl Light for PathLight {
    fn illuminate(&self, state: &mut RenderState, scene: &dyn Scene, sp: &SurfacePoint, eye: &Vector3f) -> Spectrum {
        match &self.cache {
            None => self.normal_sample(state, scene, sp, eye),
            Some(c) if c.cache.ready() => self.interpolate(c, state, scene, sp, eye),
            Some(c) => self.cached(c, state, scene, sp, eye),
        }
    }

    fn init(&self, scene: &dyn Scene) {
        let registry = scene.registry();
        let maps = GatherMaps {
            photon_map: registry.get::<PhotonMap>(GLOBAL_PHOTON_MAP),
            irradiance_map: registry.get::<PhotonMap>(IRRADIANCE_PHOTON_MAP),
            hash: registry.get::<IrradianceHash>(IRRADIANCE_HASH_MAP),
        };
        if maps.irradiance_map.is_some() {
            info!("Path light using published irradiance map");
        }
        self.maps.store(Arc::new(maps));

        if let Some(c) = &self.cache {
            c.cache.set_aspect(scene.aspect_ratio());
            c.cache.start_fill();
            scene.set_repeat_first();
            self.devaluated.store(1.0);
        }
    }

    fn post_init(&self, scene: &dyn Scene) -> bool {
        let c = match &self.cache {
            Some(c) => c,
            None => return false,
        };
        c.cache.start_use();

        if !self.options.direct && self.test_refinement(c, scene) {
            scene.set_repeat_first();
            c.cache.start_fill();
            true
        } else {
            info!("{} samples taken", c.cache.size());
            false
        }
    }

    fn use_in_indirect(&self) -> bool {
        false
    }
}

impl TryFrom<(&ParamSet, &CacheRegistry)> for PathLight {
    type Error = Error;

    /// Create a `PathLight` from a parameter set.
    ///
    /// * `p` - Tuple containing the parameter set and cache registry.
    fn try_from(p: (&ParamSet, &CacheRegistry)) -> Result<Self> {
        let (params, registry) = p;
        Self::new(PathLightOptions::from(params), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_core::shader::*;
    use float_cmp::approx_eq;

    /// Floor at z = 0 facing up, lit by a point light above it.
    pub(super) fn lit_floor() -> SimpleScene {
        let mut scene = SimpleScene::new(Spectrum::new(0.5));
        scene.set_camera(0.01, 1.0);
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.8), Spectrum::ZERO));
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-5.0, -5.0, 0.0),
                edge_u: Vector3f::new(10.0, 0.0, 0.0),
                edge_v: Vector3f::new(0.0, 10.0, 0.0),
            },
            ObjectProperties::default(),
            shader,
        );
        scene.add_light(Arc::new(PointLight::new(
            Point3f::new(0.0, 0.0, 2.0),
            Spectrum::ONE,
            4.0,
            true,
        )));
        scene
    }

    pub(super) fn floor_hit(scene: &SimpleScene, state: &mut RenderState) -> SurfacePoint {
        state.start_pixel(0, Point2f::new(0.0, 0.0));
        let from = Point3f::new(0.0, 0.0, 1.0);
        let sp = scene.first_hit(state, &from, &-Vector3f::Z_AXIS, false).unwrap();
        state.traveled = sp.z;
        sp
    }

    #[test]
    fn options_from_params() {
        let mut params = ParamSet::new();
        params.add_int("samples", &[20]);
        params.add_int("search", &[1]);
        let options = PathLightOptions::from(&params);
        assert_eq!(options.samples, 16);
        assert_eq!(options.search, 9);
        assert_eq!(options.shadow_threshold, 0.1);

        params.add_bool("cache", &[true]);
        params.add_bool("use_QMC", &[true]);
        params.add_str("mode", "occlusion");
        let options = PathLightOptions::from(&params);
        assert_eq!(options.samples, 20);
        assert_eq!(options.search, 3);
        assert_eq!(options.shadow_threshold, 0.3);
        assert!(options.occlusion);
        assert_eq!(options.max_distance, -1.0);

        params.add_int("samples", &[0]);
        assert_eq!(PathLightOptions::from(&params).samples, 1);
    }

    #[test]
    fn nested_rays_keep_weak_samples() {
        let options = PathLightOptions {
            cache: true,
            cache_size: 0.01,
            shadow_threshold: 0.3,
            search: 50,
            ..PathLightOptions::default()
        };
        let light = PathLight::new(options, &CacheRegistry::default()).unwrap();
        let c = light.cache.as_ref().unwrap();
        let mut state = RenderState::new(RNG::new(2));
        state.start_pixel(0, Point2f::new(0.0, 0.0));
        state.traveled = 1.0;
        let polar = c.cache.to_polar(&state);
        c.cache.insert(LightSample::new(
            Vector3f::Z_AXIS,
            Spectrum::new(0.5),
            1.0,
            Point3f::ORIGIN,
            polar,
            1.0,
            0.001,
            1.0,
        ));
        c.cache.start_use();

        // Same cache cell but far away in the world, so the weight stays
        // below the limit.
        let p = Point3f::new(2.0, 0.0, 0.0);
        let mut found = vec![];

        let query = c.interpolation_query(&state, p, polar, Vector3f::Z_AXIS);
        assert_eq!(query.minimum, 0);
        let mut radius = c.search_radius;
        c.cache.gather_samples(&query, &mut radius, &mut found);
        assert!(found.is_empty());

        state.ray_level = 1;
        let query = c.interpolation_query(&state, p, polar, Vector3f::Z_AXIS);
        assert_eq!(query.minimum, 3);
        let mut radius = c.search_radius;
        let best = c.cache.gather_samples(&query, &mut radius, &mut found);
        assert_eq!(found.len(), 1);
        assert!(best > 0.0 && best <= c.weight_limit);
    }

    #[test]
    fn second_cached_light_fails() {
        let registry = CacheRegistry::default();
        let mut params = ParamSet::new();
        params.add_bool("cache", &[true]);

        let first = PathLight::try_from((&params, &registry)).unwrap();
        assert!(first.light_cache().is_some());
        assert!(matches!(
            PathLight::try_from((&params, &registry)),
            Err(Error::CacheAlreadyActive)
        ));
        assert!(PathLight::try_from((&ParamSet::new(), &registry)).is_ok());

        drop(first);
        assert!(PathLight::try_from((&params, &registry)).is_ok());
    }

    #[test]
    fn direct_returns_first_bounce_light() {
        let scene = lit_floor();
        let options = PathLightOptions {
            direct: true,
            ..PathLightOptions::default()
        };
        let light = PathLight::new(options, &CacheRegistry::default()).unwrap();
        light.init(&scene);

        let mut state = RenderState::new(RNG::new(1));
        let sp = floor_hit(&scene, &mut state);
        let n = Vector3f::Z_AXIS;

        let expected = {
            let mut state = RenderState::new(RNG::new(1));
            floor_hit(&scene, &mut state);
            let direct = scene.light(&mut state, &sp, &(sp.p + n), true);
            let radiosity = sp.shader.from_radiosity(&state, &sp, &Energy::new(n, Spectrum::ZERO), &n);
            direct + radiosity
        };

        let got = light.with_thread_data(&mut state, |data, state| light.take_sample(data, state, &scene, &sp, &n, true));
        assert_eq!(got.color, expected);
        assert!(got.avg_dist > 0.0 && got.avg_dist == got.min_dist);
        assert_eq!(state.ray_division, 1);
    }

    #[test]
    fn dim_surfaces_are_black() {
        let mut scene = SimpleScene::new(Spectrum::ONE);
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.01), Spectrum::ZERO));
        scene.add(
            Shape::Sphere {
                center: Point3f::ORIGIN,
                radius: 1.0,
            },
            ObjectProperties::default(),
            shader,
        );
        let light = PathLight::new(PathLightOptions::default(), &CacheRegistry::default()).unwrap();
        light.init(&scene);

        let mut state = RenderState::new(RNG::new(2));
        let from = Point3f::new(0.0, 0.0, 3.0);
        let sp = scene.first_hit(&state, &from, &-Vector3f::Z_AXIS, false).unwrap();
        let c = light.illuminate(&mut state, &scene, &sp, &Vector3f::Z_AXIS);
        assert!(c.is_black());
        assert!(state.context.is_empty());
    }

    #[test]
    fn open_sky_occlusion_is_background() {
        let scene = lit_floor();
        let options = PathLightOptions {
            occlusion: true,
            samples: 16,
            ..PathLightOptions::default()
        };
        let light = PathLight::new(options, &CacheRegistry::default()).unwrap();
        light.init(&scene);

        let mut state = RenderState::new(RNG::new(3));
        let sp = floor_hit(&scene, &mut state);
        let c = light.illuminate(&mut state, &scene, &sp, &Vector3f::Z_AXIS);

        // Unoccluded cosine weighted hemisphere of a constant background.
        assert!(c.r() > 0.0);
        assert!(approx_eq!(Float, c.r(), c.g(), epsilon = 1e-6));
        assert_eq!(state.context.len(), 1);
        assert_eq!(state.ray_division, 1);
        assert!(state.skip.is_none());
    }

    #[test]
    fn blend_weights() {
        assert!(blend(&[], 2.0, 1.0).is_none());

        let one = Neighbour {
            weight: 3.0,
            dis: 0.5,
            color: Spectrum::new(0.4),
        };
        assert_eq!(blend(&[one], 2.0, 1.0), Some(Spectrum::new(0.4)));

        // The weakest sample gets no weight.
        let weak = Neighbour {
            weight: 1.0,
            dis: 0.0,
            color: Spectrum::ONE,
        };
        let strong = Neighbour {
            weight: 3.0,
            dis: 0.0,
            color: Spectrum::new(0.2),
        };
        let mixed = blend(&[weak, strong], 2.0, 1.0).unwrap();
        assert!(approx_eq!(Float, mixed.r(), 0.2, epsilon = 1e-6));
    }
}
