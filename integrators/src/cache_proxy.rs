//! Cache Proxy

use crate::light_cache::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;

/// Number of local samples kept across pixels before they are dropped.
const MAX_CREATED: usize = 600;

/// A sample returned through a `CacheProxy`.
#[derive(Copy, Clone, Debug)]
pub struct ProxySample {
    /// The sample.
    pub sample: LightSample,

    /// Cache-space distance to the query.
    pub dis: Float,

    /// Weight at the query.
    pub weight: Float,
}

/// Per-thread front end of the light cache. Adds samples computed locally
/// on a cache miss, which the shared cache never sees.
pub struct CacheProxy {
    /// Pixel of the last query.
    pixel: i64,

    /// Maximum search radius.
    max_radius: Float,

    /// Radius estimate carried between queries.
    radius: Float,

    /// Local samples.
    created: Vec<LightSample>,

    /// Scratch buffer for cache gathers.
    found: Vec<FoundSample>,
}

impl CacheProxy {
    /// Create a new `CacheProxy`.
    ///
    /// * `max_radius` - Maximum search radius.
    pub fn new(max_radius: Float) -> Self {
        Self {
            pixel: -1,
            max_radius,
            radius: max_radius,
            created: vec![],
            found: vec![],
        }
    }

    /// Number of local samples.
    pub fn created(&self) -> usize {
        self.created.len()
    }

    /// Gather from the cache; when that finds nothing, gather from the local
    /// samples. The proxy's own radius estimate and maximum radius replace
    /// the ones in `query`. `found` holds the samples weakest first.
    ///
    /// * `cache` - The light cache.
    /// * `state` - Render state.
    /// * `query` - Gather parameters.
    /// * `found` - Output; cleared first.
    pub fn gather_samples(
        &mut self,
        cache: &LightCache,
        state: &RenderState,
        query: &GatherQuery,
        found: &mut Vec<ProxySample>,
    ) {
        if state.pixel != self.pixel {
            self.reset();
            self.pixel = state.pixel;
        }
        found.clear();

        let query = GatherQuery {
            max_radius: self.max_radius,
            ..*query
        };
        match cache.view() {
            Some(view) => {
                view.gather_samples(&query, &mut self.radius, &mut self.found);
                found.extend(self.found.iter().map(|f| ProxySample {
                    sample: *view.sample(f.index),
                    dis: f.dis,
                    weight: f.weight,
                }));
            }
            None => warn!("Using unfinished cache"),
        }
        if !found.is_empty() {
            return;
        }

        let max_weight = query.weight_limit * 2.5;
        let mut heap = WeightHeap::with_capacity(query.k + 1);
        for (index, sample) in self.created.iter().enumerate() {
            let dis = cache.polar_dist(&query.polar, &sample.polar);
            if dis > self.max_radius {
                continue;
            }
            let weight = query.weight.eval(sample, &query.p, &query.n, max_weight);
            let limit = if weight <= query.weight_limit { query.minimum } else { query.k };
            heap.offer(limit, FoundSample { index, dis, weight });
        }

        self.found.clear();
        heap.drain_into(&mut self.found);
        found.extend(self.found.iter().map(|f| ProxySample {
            sample: self.created[f.index],
            dis: f.dis,
            weight: f.weight,
        }));
    }

    /// Record a locally computed sample.
    ///
    /// * `sample` - The sample.
    pub fn add_sample(&mut self, sample: LightSample) {
        self.created.push(sample);
    }

    /// Called when the pixel changes.
    fn reset(&mut self) {
        if self.created.len() > MAX_CREATED {
            self.created.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_core::geometry::*;
    use photon_core::spectrum::*;

    fn sample(cache: &LightCache, state: &RenderState) -> LightSample {
        LightSample::new(
            Vector3f::Z_AXIS,
            Spectrum::new(0.25),
            1.0,
            Point3f::ORIGIN,
            cache.to_polar(state),
            1.0,
            0.001,
            1.0,
        )
    }

    fn query(cache: &LightCache, state: &RenderState) -> GatherQuery {
        GatherQuery {
            p: Point3f::ORIGIN,
            polar: cache.to_polar(state),
            n: Vector3f::Z_AXIS,
            k: 5,
            max_radius: 0.0,
            minimum: 0,
            weight: SampleWeight::INTERPOLATE,
            weight_limit: 0.8 / 0.3,
        }
    }

    fn state(pixel: i64) -> RenderState {
        let mut state = RenderState::default();
        state.start_pixel(pixel, Point2f::new(0.0, 0.0));
        state.traveled = 1.0;
        state
    }

    #[test]
    fn local_samples_fill_cache_misses() {
        let cache = LightCache::new(0.01);
        cache.start_use();
        let state = state(3);

        let mut proxy = CacheProxy::new(0.02);
        let mut found = vec![];
        proxy.gather_samples(&cache, &state, &query(&cache, &state), &mut found);
        assert!(found.is_empty());

        proxy.add_sample(sample(&cache, &state));
        proxy.gather_samples(&cache, &state, &query(&cache, &state), &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sample.color, Spectrum::new(0.25));

        let mut other = vec![];
        CacheProxy::new(0.02).gather_samples(&cache, &state, &query(&cache, &state), &mut other);
        assert!(other.is_empty());
    }

    #[test]
    fn cache_hits_take_precedence() {
        let cache = LightCache::new(0.01);
        let state = state(0);
        let mut cached = sample(&cache, &state);
        cached.color = Spectrum::ONE;
        cache.insert(cached);
        cache.start_use();

        let mut proxy = CacheProxy::new(0.02);
        proxy.add_sample(sample(&cache, &state));
        let mut found = vec![];
        proxy.gather_samples(&cache, &state, &query(&cache, &state), &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sample.color, Spectrum::ONE);
    }

    #[test]
    fn local_samples_survive_until_limit() {
        let cache = LightCache::new(0.01);
        cache.start_use();
        let mut proxy = CacheProxy::new(0.02);
        let mut found = vec![];

        let first = state(0);
        for _ in 0..MAX_CREATED {
            proxy.add_sample(sample(&cache, &first));
        }
        proxy.gather_samples(&cache, &state(1), &query(&cache, &first), &mut found);
        assert_eq!(proxy.created(), MAX_CREATED);

        proxy.add_sample(sample(&cache, &first));
        proxy.gather_samples(&cache, &state(2), &query(&cache, &first), &mut found);
        assert_eq!(proxy.created(), 0);
        assert!(found.is_empty());
    }
}
