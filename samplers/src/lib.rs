//! Hemisphere samplers used for final gathering.

#[macro_use]
extern crate log;

use photon_core::geometry::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::spectrum::*;

mod halton;
mod jittered;
mod photon;

// Re-export.
pub use halton::*;
pub use jittered::*;
pub use photon::*;

/// Generates directions over the hemisphere around a surface normal.
pub trait HemiSampler: Send {
    /// Prepare for sampling the hemisphere at a new point.
    ///
    /// * `state` - Render state.
    /// * `p`     - Surface point.
    /// * `n`     - Surface normal.
    /// * `ru`    - First tangent.
    /// * `rv`    - Second tangent.
    fn sampling_from(&mut self, state: &mut RenderState, p: &Point3f, n: &Vector3f, ru: &Vector3f, rv: &Vector3f);

    /// Returns the next direction. Samplers that importance sample scale
    /// `ray_color` by the compensation weight.
    ///
    /// * `p`          - Surface point.
    /// * `n`          - Surface normal.
    /// * `ru`         - First tangent.
    /// * `rv`         - Second tangent.
    /// * `cur_sample` - Sample index.
    /// * `level`      - Bounce level, 0 for the first bounce.
    /// * `ray_color`  - Path throughput.
    #[allow(clippy::too_many_arguments)]
    fn next_direction(
        &mut self,
        p: &Point3f,
        n: &Vector3f,
        ru: &Vector3f,
        rv: &Vector3f,
        cur_sample: usize,
        level: usize,
        ray_color: &mut Spectrum,
    ) -> Vector3f;

    /// Returns the factor that turns the summed samples into an average.
    fn multiplier(&self) -> Float;

    /// Restart the sample sequence at the current point.
    fn reset(&mut self);
}

/// Boxed `HemiSampler` stored in per-thread render state.
pub type BoxedHemiSampler = Box<dyn HemiSampler>;
