//! Cache refinement between preparatory passes.

use super::*;

/// Samples gathered around each cached sample to judge its noise.
const NEIGHBOURS: usize = 5;

impl PathLight {
    /// Blend every cached sample with its neighbours, then devaluate the
    /// samples whose neighbourhood still varies by more than the threshold
    /// so that the next pass resamples around them. Returns true if any
    /// sample was devaluated. Once the refinement limit is reached all
    /// devaluations are reset and false is returned.
    ///
    /// * `c`     - Cache settings.
    /// * `scene` - The scene.
    pub(super) fn test_refinement(&self, c: &CacheSettings, scene: &dyn Scene) -> bool {
        if self.options.threshold >= 1.0 {
            return false;
        }
        if self.refined.load(Ordering::Acquire) >= self.options.max_refinement {
            c.cache.reset_devaluations();
            return false;
        }
        let devaluated = self.devaluated.mul(2.0);
        self.refined.fetch_add(1, Ordering::AcqRel);

        let view = match c.cache.view() {
            Some(view) => view,
            None => return false,
        };

        let mut found = Vec::with_capacity(c.search + 1);
        let mut radius = c.search_radius;
        let mixed: Vec<Spectrum> = view
            .samples()
            .iter()
            .map(|s| {
                let query = GatherQuery {
                    p: s.p,
                    polar: s.polar,
                    n: s.n,
                    k: c.search,
                    max_radius: c.search_radius,
                    minimum: 2,
                    weight: SampleWeight::MISS,
                    weight_limit: c.weight_limit,
                };
                view.gather_samples(&query, &mut radius, &mut found);
                let neighbours: Vec<Neighbour> = found
                    .iter()
                    .map(|f| Neighbour {
                        weight: f.weight,
                        dis: f.dis,
                        color: view.sample(f.index).color,
                    })
                    .collect();
                blend(&neighbours, c.weight_limit, c.search_radius).map_or(Spectrum::ZERO, |m| m * self.options.power)
            })
            .collect();
        c.cache.update_samples(|samples| {
            samples.iter_mut().zip(&mixed).for_each(|(s, m)| s.mixed = *m);
        });

        let view = match c.cache.view() {
            Some(view) => view,
            None => return false,
        };
        let power = self.options.power;
        let mut radius = c.search_radius;
        let noisy: Vec<bool> = view
            .samples()
            .iter()
            .map(|s| {
                let query = GatherQuery {
                    p: s.p,
                    polar: s.polar,
                    n: s.n,
                    k: NEIGHBOURS,
                    max_radius: c.search_radius,
                    minimum: NEIGHBOURS,
                    weight: SampleWeight::NEIGHBOUR,
                    weight_limit: c.weight_limit,
                };
                view.gather_samples(&query, &mut radius, &mut found);
                let (lo, hi) = found
                    .iter()
                    .map(|f| view.sample(f.index).mixed)
                    .fold((Spectrum::new(1000.0), Spectrum::ZERO), |(lo, hi), m| (lo.min(&m), hi.max(&m)));
                let lo = scene.adjust_color(&(lo * power)).clamp01();
                let hi = scene.adjust_color(&(hi * power)).clamp01();
                hi.max_abs_diff(&lo) > self.options.threshold
            })
            .collect();

        let change = noisy.iter().filter(|&&n| n).count();
        if change > 0 {
            c.cache.update_samples(|samples| {
                samples
                    .iter_mut()
                    .zip(&noisy)
                    .filter(|(_, &n)| n)
                    .for_each(|(s, _)| s.devaluated = devaluated);
            });
        }
        info!("Refinement: {}/{}", change, noisy.len());
        change > 0
    }
}
