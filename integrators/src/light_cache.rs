//! Light Cache

use accelerators::*;
use arc_swap::ArcSwapOption;
use photon_core::error::*;
use photon_core::geometry::*;
use photon_core::parallel::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::spectrum::*;
use itertools::iproduct;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

/// A cached irradiance estimate.
#[derive(Copy, Clone, Debug)]
pub struct LightSample {
    /// Surface normal.
    pub n: Vector3f,

    /// Estimated irradiance.
    pub color: Spectrum,

    /// Neighbourhood blend computed during refinement.
    pub mixed: Spectrum,

    /// Harmonic mean distance to occluders.
    pub adist: Float,

    /// Distance to the closest occluder.
    pub min_dist: Float,

    /// World-space footprint of a pixel at the sample.
    pub precision: Float,

    /// World position.
    pub p: Point3f,

    /// Cache-space position.
    pub polar: Point3f,

    /// Weight divisor raised by refinement.
    pub devaluated: Float,
}

impl LightSample {
    /// Create a new `LightSample`.
    ///
    /// * `n`          - Surface normal.
    /// * `color`      - Estimated irradiance.
    /// * `adist`      - Harmonic mean distance to occluders.
    /// * `p`          - World position.
    /// * `polar`      - Cache-space position.
    /// * `min_dist`   - Distance to the closest occluder.
    /// * `precision`  - Pixel footprint at the sample.
    /// * `devaluated` - Initial devaluation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n: Vector3f,
        color: Spectrum,
        adist: Float,
        p: Point3f,
        polar: Point3f,
        min_dist: Float,
        precision: Float,
        devaluated: Float,
    ) -> Self {
        Self {
            n,
            color,
            mixed: Spectrum::ZERO,
            adist,
            min_dist,
            precision,
            p,
            polar,
            devaluated,
        }
    }
}

/// Weighting strategy used to rate how well a cached sample represents a
/// shading point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleWeight {
    /// Measure distance relative to the sample's occlusion distance. When
    /// false the distance is measured in units of the sample footprint.
    pub use_occlusion: bool,

    /// Number of footprints subtracted from the distance.
    pub precision_margin: Float,

    /// Divide by the sample's devaluation.
    pub use_devaluation: bool,

    /// Footprint multiple used when occlusion is ignored.
    pub precision_scale: Float,
}

impl SampleWeight {
    /// Used when interpolating the final image.
    pub const INTERPOLATE: Self = Self {
        use_occlusion: true,
        precision_margin: 2.0,
        use_devaluation: true,
        precision_scale: 40.0,
    };

    /// Used when deciding whether a point needs a new sample.
    pub const SUFFICIENCY: Self = Self {
        use_occlusion: true,
        precision_margin: 0.0,
        use_devaluation: true,
        precision_scale: 40.0,
    };

    /// Used to compare neighbouring samples during refinement.
    pub const NEIGHBOUR: Self = Self {
        use_occlusion: false,
        precision_margin: 0.0,
        use_devaluation: false,
        precision_scale: 40.0,
    };

    /// Used to blend samples during refinement.
    pub const MISS: Self = Self {
        use_occlusion: true,
        precision_margin: 1.0,
        use_devaluation: false,
        precision_scale: 40.0,
    };

    /// Returns the weight of `sample` at a shading point, never more than
    /// `max_weight`.
    ///
    /// * `sample`     - Cached sample.
    /// * `p`          - Shading point.
    /// * `n`          - Shading normal.
    /// * `max_weight` - Weight cap.
    pub fn eval(&self, sample: &LightSample, p: &Point3f, n: &Vector3f, max_weight: Float) -> Float {
        if self.use_occlusion && sample.adist == 0.0 {
            return 0.0;
        }

        let mut pp = *p - sample.p;
        let d = pp.norm_len();
        let a = if self.use_occlusion {
            max(0.0, d - self.precision_margin * sample.precision) / sample.adist
        } else {
            let scale = sample.precision * self.precision_scale;
            if scale > 0.0 {
                d / scale
            } else if d > 0.0 {
                INFINITY
            } else {
                0.0
            }
        };
        let b = max(0.0, 1.000001 - sample.n.dot(n)).sqrt();
        let c = n.dot(&pp).abs();
        let dev = if self.use_devaluation { sample.devaluated } else { 1.0 };

        let f = dev * (a + max(b, c));
        if f == 0.0 {
            max_weight
        } else {
            min(1.0 / f, max_weight)
        }
    }
}

/// Cache hash bucket.
#[derive(Clone, Debug, Default)]
pub struct LightAccum {
    /// Indices of the samples in the bucket, most recently useful first.
    pub samples: VecDeque<usize>,

    /// Whether the bucket has been filled.
    pub valid: bool,
}

/// A sample reached by a gather.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FoundSample {
    /// Sample index.
    pub index: usize,

    /// Cache-space distance to the query.
    pub dis: Float,

    /// Weight at the query.
    pub weight: Float,
}

/// Parameters of a weighted gather.
#[derive(Copy, Clone, Debug)]
pub struct GatherQuery {
    /// Shading point.
    pub p: Point3f,

    /// Cache-space position of the shading point.
    pub polar: Point3f,

    /// Shading normal.
    pub n: Vector3f,

    /// Maximum number of well weighted samples.
    pub k: usize,

    /// Upper bound of the search radius.
    pub max_radius: Float,

    /// Maximum number of poorly weighted samples.
    pub minimum: usize,

    /// Weighting strategy.
    pub weight: SampleWeight,

    /// Weight separating poor from good samples.
    pub weight_limit: Float,
}

/// Bounded heap keeping the best weighted samples. The weakest sample is on
/// top.
pub(crate) struct WeightHeap {
    heap: BinaryHeap<(Reverse<OrderedFloat<Float>>, OrderedFloat<Float>, usize)>,
}

impl WeightHeap {
    /// Create an empty heap.
    ///
    /// * `capacity` - Expected number of entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offer a sample. It is kept if fewer than `limit` samples are held or
    /// it outweighs the weakest one.
    ///
    /// * `limit` - Maximum number of samples.
    /// * `found` - The sample.
    pub(crate) fn offer(&mut self, limit: usize, found: FoundSample) {
        if limit == 0 {
            return;
        }
        if self.heap.len() >= limit && self.weakest().map_or(false, |w| found.weight < w.weight) {
            return;
        }
        self.heap
            .push((Reverse(OrderedFloat(found.weight)), OrderedFloat(found.dis), found.index));
        if self.heap.len() > limit {
            self.heap.pop();
        }
    }

    /// Returns the weakest sample held.
    pub(crate) fn weakest(&self) -> Option<FoundSample> {
        self.heap.peek().map(|&(Reverse(weight), dis, index)| FoundSample {
            index,
            dis: dis.0,
            weight: weight.0,
        })
    }

    /// Returns true if nothing is held.
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Move the samples into `found`, weakest first.
    ///
    /// * `found` - Output.
    pub(crate) fn drain_into(self, found: &mut Vec<FoundSample>) {
        found.extend(
            self.heap
                .into_sorted_vec()
                .into_iter()
                .rev()
                .map(|(Reverse(weight), dis, index)| FoundSample {
                    index,
                    dis: dis.0,
                    weight: weight.0,
                }),
        );
    }
}

/// Read-only view of the cache published when it enters the USE phase.
pub struct CacheView {
    /// All samples. `FoundSample::index` points in here.
    samples: Arc<Vec<LightSample>>,

    /// Tree over cache-space positions.
    tree: Arc<PointKdTree>,
}

impl CacheView {
    /// Returns all samples.
    pub fn samples(&self) -> &[LightSample] {
        &self.samples
    }

    /// Returns a sample.
    ///
    /// * `index` - Sample index.
    pub fn sample(&self, index: usize) -> &LightSample {
        &self.samples[index]
    }

    /// Weighted k-nearest gather with an expanding radius.
    ///
    /// Every pass looks at the ring `last_radius <= d < radius`. The radius
    /// doubles while nothing was found, the best sample is weak, or the
    /// occlusion distance of the best sample is large compared to the
    /// covered area. Returns the weight of the weakest sample kept, or 0
    /// when nothing was found. `found` holds the samples weakest first.
    ///
    /// * `query`  - Gather parameters.
    /// * `radius` - Initial radius; updated for the next nearby query.
    /// * `found`  - Output; cleared first.
    pub fn gather_samples(&self, query: &GatherQuery, radius: &mut Float, found: &mut Vec<FoundSample>) -> Float {
        found.clear();
        if *radius <= 0.0 {
            *radius = query.max_radius;
        }

        let max_weight = query.weight_limit * 2.5;
        let min_weight = query.weight_limit * 0.6;
        let mut heap = WeightHeap::with_capacity(query.k + 1);
        let mut best = 0.0;
        let mut adist = 0.0;
        let mut max_dist = 0.0;
        let mut last_radius = 0.0;
        let mut reached = 0;

        loop {
            let r = *radius;
            self.tree.for_each_within(&query.polar, r, |index, dis| {
                if dis >= r || dis < last_radius {
                    return;
                }
                reached += 1;

                let sample = &self.samples[index];
                let weight = query.weight.eval(sample, &query.p, &query.n, max_weight);
                if weight > best {
                    best = weight;
                    adist = sample.adist;
                }

                let limit = if weight <= query.weight_limit {
                    query.minimum
                } else {
                    if dis > max_dist {
                        max_dist = dis;
                    }
                    query.k
                };
                heap.offer(limit, FoundSample { index, dis, weight });
            });

            let mut rrad = match heap.weakest() {
                Some(w) if w.dis != 0.0 => r * self.samples[w.index].p.distance(&query.p) / w.dis,
                _ => 0.0001 * adist,
            };
            if rrad == 0.0 {
                rrad = 1.0;
            }

            let repeat = (heap.is_empty() || (adist / rrad > query.weight_limit && reached < query.k) || best <= min_weight)
                && *radius < query.max_radius;
            if repeat {
                last_radius = *radius;
                *radius *= 2.0;
            }
            if *radius > query.max_radius {
                *radius = query.max_radius;
            }
            if !repeat {
                break;
            }
        }

        if max_dist > 0.0 && max_dist / *radius < INV_SQRT_2 {
            *radius *= 0.9;
        }

        heap.drain_into(found);
        found.first().map_or(0.0, |f| f.weight)
    }
}

/// Samples and hash mutated while filling.
struct FillState {
    /// Buckets of sample indices by cache-space cell.
    hash: Hash3D<LightAccum>,

    /// Sample arena.
    samples: Vec<LightSample>,
}

/// Irradiance cache.
///
/// Filled by concurrent inserts during preparatory passes (FILL), then
/// turned into an immutable view for lock free gathers (USE).
pub struct LightCache {
    /// Cell size and sufficiency radius in cache space.
    cache_size: Float,

    /// Hash and sample arena.
    fill: Mutex<FillState>,

    /// Published view; present only in the USE phase.
    view: ArcSwapOption<CacheView>,

    /// Scales screen y so that cache space is isotropic.
    y_correction: AtomicFloat,

    /// Number of inserted samples.
    inserted: AtomicUsize,
}

impl LightCache {
    /// Create a new empty `LightCache` in the FILL phase.
    ///
    /// * `cache_size` - Cell size in cache space; non-positive values fall
    ///                  back to 1.
    pub fn new(cache_size: Float) -> Self {
        let cache_size = if cache_size > 0.0 {
            cache_size
        } else {
            warn!("Cache size {} must be positive, using 1", cache_size);
            1.0
        };
        Self {
            cache_size,
            fill: Mutex::new(FillState {
                hash: Hash3D::new(cache_size),
                samples: vec![],
            }),
            view: ArcSwapOption::empty(),
            y_correction: AtomicFloat::new(1.0),
            inserted: AtomicUsize::new(0),
        }
    }

    /// Set the image aspect ratio used by `to_polar`.
    ///
    /// * `aspect` - Width over height.
    pub fn set_aspect(&self, aspect: Float) {
        if aspect > 0.0 {
            self.y_correction.store(1.0 / aspect);
        } else {
            warn!("Ignoring aspect ratio {aspect}");
        }
    }

    /// Discard the view and accept inserts again.
    pub fn start_fill(&self) {
        if self.view.swap(None).is_some() {
            debug!("Light cache back to fill phase");
        }
    }

    /// Build the search tree and publish the view.
    pub fn start_use(&self) {
        if self.ready() {
            return;
        }
        let fill = self.fill.lock().unwrap_or_else(PoisonError::into_inner);
        let positions: Vec<Point3f> = fill.samples.iter().map(|s| s.polar).collect();
        let tree = PointKdTree::new(&positions, 1);
        self.view.store(Some(Arc::new(CacheView {
            samples: Arc::new(fill.samples.clone()),
            tree: Arc::new(tree),
        })));
    }

    /// Returns true in the USE phase.
    pub fn ready(&self) -> bool {
        self.view.load().is_some()
    }

    /// Returns the number of inserted samples.
    pub fn size(&self) -> usize {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Returns the cell size.
    pub fn cache_size(&self) -> Float {
        self.cache_size
    }

    /// Returns the view published by `start_use`.
    pub fn view(&self) -> Option<Arc<CacheView>> {
        self.view.load_full()
    }

    /// Returns the cache-space position of the current shading point:
    /// screen position with aspect corrected y, and log of the travelled
    /// distance.
    ///
    /// * `state` - Render state.
    pub fn to_polar(&self, state: &RenderState) -> Point3f {
        let depth = if state.traveled > 0.0 { state.traveled.ln() } else { 0.0 };
        Point3f::new(
            state.screen_pos.x,
            state.screen_pos.y * self.y_correction.load(),
            depth,
        )
    }

    /// Returns the distance between two cache-space positions.
    ///
    /// * `a` - First position.
    /// * `b` - Second position.
    pub fn polar_dist(&self, a: &Point3f, b: &Point3f) -> Float {
        a.distance(b)
    }

    /// Add a sample to the bucket of its cache-space position.
    ///
    /// * `sample` - The sample.
    pub fn insert(&self, sample: LightSample) {
        let mut fill = self.fill.lock().unwrap_or_else(PoisonError::into_inner);
        let index = fill.samples.len();
        fill.samples.push(sample);

        let accum = fill.hash.find_box(&sample.polar);
        if !accum.valid {
            accum.samples.clear();
        }
        accum.samples.push_front(index);
        accum.valid = true;
        drop(fill);

        self.inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns true if a sample close to the shading point already reaches
    /// `desired` weight. That sample moves to the front of its bucket.
    ///
    /// * `p`       - Shading point.
    /// * `n`       - Shading normal.
    /// * `state`   - Render state.
    /// * `weight`  - Weighting strategy.
    /// * `desired` - Weight to reach.
    pub fn enough_for(
        &self,
        p: &Point3f,
        n: &Vector3f,
        state: &RenderState,
        weight: SampleWeight,
        desired: Float,
    ) -> bool {
        let polar = self.to_polar(state);
        let max_weight = desired * 2.0;

        let mut fill = self.fill.lock().unwrap_or_else(PoisonError::into_inner);
        let FillState { hash, samples } = &mut *fill;
        let (cx, cy, cz) = hash.cell_of(&polar);

        for key in iproduct!([cx, cx - 1, cx + 1], [cy, cy - 1, cy + 1], [cz, cz - 1, cz + 1]) {
            let accum = match hash.get_cell_mut(&key) {
                Some(accum) if accum.valid => accum,
                _ => continue,
            };
            let hit = accum.samples.iter().position(|&i| {
                let s = &samples[i];
                self.polar_dist(&polar, &s.polar) <= self.cache_size && weight.eval(s, p, n, max_weight) >= desired
            });
            if let Some(pos) = hit {
                if let Some(i) = accum.samples.remove(pos) {
                    accum.samples.push_front(i);
                }
                return true;
            }
        }
        false
    }

    /// Gather from the published view. In the FILL phase this warns and
    /// returns 0 with nothing found.
    ///
    /// * `query`  - Gather parameters.
    /// * `radius` - Initial radius; updated.
    /// * `found`  - Output; cleared first.
    pub fn gather_samples(&self, query: &GatherQuery, radius: &mut Float, found: &mut Vec<FoundSample>) -> Float {
        match &*self.view.load() {
            Some(view) => view.gather_samples(query, radius, found),
            None => {
                warn!("Using unfinished cache");
                found.clear();
                0.0
            }
        }
    }

    /// Modify the samples in place. Positions must not change. An active
    /// view is republished with the new values.
    ///
    /// * `f` - Function applied to all samples.
    pub fn update_samples<F>(&self, f: F)
    where
        F: FnOnce(&mut [LightSample]),
    {
        let mut fill = self.fill.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut fill.samples);
        if let Some(view) = self.view.load_full() {
            self.view.store(Some(Arc::new(CacheView {
                samples: Arc::new(fill.samples.clone()),
                tree: Arc::clone(&view.tree),
            })));
        }
    }

    /// Reset every sample's devaluation to 1.
    pub fn reset_devaluations(&self) {
        self.update_samples(|samples| samples.iter_mut().for_each(|s| s.devaluated = 1.0));
    }
}

/// Hands out the irradiance cache. Only one cache may be alive at a time.
#[derive(Default)]
pub struct CacheRegistry {
    /// The cache handed out last.
    active: Mutex<Weak<LightCache>>,
}

impl CacheRegistry {
    /// Returns the process wide registry.
    pub fn global() -> &'static CacheRegistry {
        static GLOBAL: OnceLock<CacheRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CacheRegistry::default)
    }

    /// Create the cache. Fails while a previously created cache is still
    /// alive.
    ///
    /// * `cache_size` - Cell size in cache space.
    pub fn claim(&self, cache_size: Float) -> Result<Arc<LightCache>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.upgrade().is_some() {
            return Err(Error::CacheAlreadyActive);
        }
        let cache = Arc::new(LightCache::new(cache_size));
        *active = Arc::downgrade(&cache);
        Ok(cache)
    }
}
