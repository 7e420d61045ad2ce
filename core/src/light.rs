//! Light

use crate::geometry::*;
use crate::render_state::*;
use crate::rng::RNG;
use crate::scene::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Light interface. Besides direct emitters this covers the global
/// illumination passes, which are driven through the same life cycle.
pub trait Light: Send + Sync {
    /// Returns the radiance this light contributes at the surface point,
    /// as seen from `eye`.
    ///
    /// * `state` - Render state.
    /// * `scene` - The scene.
    /// * `sp`    - Surface point.
    /// * `eye`   - Unit direction towards the viewer.
    fn illuminate(&self, state: &mut RenderState, scene: &dyn Scene, sp: &SurfacePoint, eye: &Vector3f) -> Spectrum;

    /// Called once before rendering.
    ///
    /// * `scene` - The scene.
    fn init(&self, _scene: &dyn Scene) {}

    /// Called after each preparatory pass. Returns true when another pass is
    /// required.
    ///
    /// * `scene` - The scene.
    fn post_init(&self, _scene: &dyn Scene) -> bool {
        false
    }

    /// Returns a photon emitter for this light, if it emits photons.
    ///
    /// * `max_samples` - Expected number of photons.
    fn emitter(&self, _max_samples: usize) -> Option<Box<dyn Emitter>> {
        None
    }

    /// Whether the light contributes to camera ray shading.
    fn use_in_render(&self) -> bool {
        true
    }

    /// Whether the light contributes to shading at indirect bounces.
    fn use_in_indirect(&self) -> bool {
        true
    }
}

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light>;

/// Photon source.
pub trait Emitter: Send {
    /// Prepare for emitting `n` photons in total.
    ///
    /// * `n` - Number of photons.
    fn num_samples(&mut self, n: usize);

    /// Returns the origin, direction and color of photon `i`.
    ///
    /// * `i`   - Photon index.
    /// * `rng` - Random number generator.
    fn get_direction(&self, i: usize, rng: &mut RNG) -> (Point3f, Vector3f, Spectrum);

    /// Whether the first hit of emitted photons is stored.
    fn store_direct(&self) -> bool {
        false
    }
}
