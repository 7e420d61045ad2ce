//! Scene

use crate::geometry::*;
use crate::light::*;
use crate::pbrt::*;
use crate::render_state::*;
use crate::shader::*;
use crate::spectrum::*;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

mod simple;

// Re-export
pub use simple::*;

/// Minimum distance a secondary ray travels before it can hit anything.
pub const MIN_RAYDIST: Float = 0.00005;

/// Identifies a scene element for self-intersection avoidance.
pub type ElementId = usize;

/// Specular interface that photons and caustic paths can follow.
#[derive(Copy, Clone, Debug)]
pub struct Caustic {
    /// Mirror reflection color.
    pub reflect: Spectrum,

    /// Transmission color.
    pub transmit: Spectrum,

    /// Index of refraction.
    pub ior: Float,
}

/// Global illumination flags of an object.
#[derive(Copy, Clone, Debug)]
pub struct ObjectProperties {
    /// Whether photons are stored on the object.
    pub receive_radiosity: bool,

    /// Whether the object diffusely bounces photons.
    pub use_for_radiosity: bool,

    /// Whether the object occludes lights.
    pub cast_shadows: bool,

    /// Specular interface, if any.
    pub caustic: Option<Caustic>,
}

impl Default for ObjectProperties {
    fn default() -> Self {
        Self {
            receive_radiosity: true,
            use_for_radiosity: true,
            cast_shadows: true,
            caustic: None,
        }
    }
}

/// A ray-surface intersection.
#[derive(Clone)]
pub struct SurfacePoint {
    /// Hit position.
    pub p: Point3f,

    /// Shading normal.
    pub n: Vector3f,

    /// Geometric normal.
    pub ng: Vector3f,

    /// Shading normal before bump mapping.
    pub nd: Vector3f,

    /// First tangent.
    pub nu: Vector3f,

    /// Second tangent.
    pub nv: Vector3f,

    /// Distance from the ray origin.
    pub z: Float,

    /// Element that was hit.
    pub origin: ElementId,

    /// Flags of the object that was hit.
    pub object: ObjectProperties,

    /// Surface shader.
    pub shader: ArcShader,
}

/// Named artifacts that lights publish during initialisation for other
/// lights to consume.
#[derive(Default)]
pub struct ArtifactRegistry {
    items: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ArtifactRegistry {
    /// Publish an artifact, replacing any previous one with the same name.
    ///
    /// * `name`  - Artifact name.
    /// * `value` - The artifact.
    pub fn publish<T: Any + Send + Sync>(&self, name: &str, value: Arc<T>) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(name.to_owned(), value);
    }

    /// Returns the artifact with the given name if it exists and has type
    /// `T`.
    ///
    /// * `name` - Artifact name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(name).cloned().and_then(|a| a.downcast::<T>().ok())
    }
}

/// Scene queries used by lights.
pub trait Scene: Send + Sync {
    /// Returns the closest intersection along the ray, ignoring the element
    /// in `state.skip`.
    ///
    /// * `state`  - Render state.
    /// * `from`   - Ray origin.
    /// * `dir`    - Unit ray direction.
    /// * `shadow` - Only consider shadow casting objects.
    fn first_hit(&self, state: &RenderState, from: &Point3f, dir: &Vector3f, shadow: bool) -> Option<SurfacePoint>;

    /// Returns true if something blocks the segment from `sp` to `to`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `to`    - End point.
    fn is_shadowed(&self, state: &RenderState, sp: &SurfacePoint, to: &Point3f) -> bool;

    /// Returns true if something blocks the ray from `sp` along `dir`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `dir`   - Unit direction.
    fn is_shadowed_dir(&self, state: &RenderState, sp: &SurfacePoint, dir: &Vector3f) -> bool;

    /// Returns the background radiance in a direction.
    ///
    /// * `dir`      - Unit direction.
    /// * `state`    - Render state.
    /// * `indirect` - Whether queried from an indirect bounce.
    fn background(&self, dir: &Vector3f, state: &RenderState, indirect: bool) -> Spectrum;

    /// Returns all lights.
    fn lights(&self) -> &[ArcLight];

    /// Returns the sum of all lights' contributions at `sp` towards `from`.
    ///
    /// * `state`    - Render state.
    /// * `sp`       - Surface point.
    /// * `from`     - Viewer position.
    /// * `indirect` - Only use lights enabled for indirect bounces.
    fn light(&self, state: &mut RenderState, sp: &SurfacePoint, from: &Point3f, indirect: bool) -> Spectrum;

    /// Returns the artifact registry.
    fn registry(&self) -> &ArtifactRegistry;

    /// Returns the world-space size of a pixel at unit distance.
    fn world_resolution(&self) -> Float;

    /// Returns the image width over height.
    fn aspect_ratio(&self) -> Float;

    /// Apply output exposure adjustments to a color.
    ///
    /// * `c` - Color.
    fn adjust_color(&self, c: &Spectrum) -> Spectrum {
        *c
    }

    /// Request another preparatory pass.
    fn set_repeat_first(&self);

    /// Returns whether a preparatory pass was requested, clearing the
    /// request.
    fn take_repeat_first(&self) -> bool;
}

/// Sum the contributions of the scene lights at `sp`. Shared by `Scene`
/// implementations.
///
/// * `scene`    - The scene.
/// * `state`    - Render state.
/// * `sp`       - Surface point.
/// * `from`     - Viewer position.
/// * `indirect` - Only use lights enabled for indirect bounces.
pub fn gather_light(
    scene: &dyn Scene,
    state: &mut RenderState,
    sp: &SurfacePoint,
    from: &Point3f,
    indirect: bool,
) -> Spectrum {
    let eye = (*from - sp.p).normalize_or_zero();
    scene
        .lights()
        .iter()
        .filter(|l| if indirect { l.use_in_indirect() } else { l.use_in_render() })
        .fold(Spectrum::ZERO, |acc, l| acc + l.illuminate(state, scene, sp, &eye))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_typed_lookup() {
        let registry = ArtifactRegistry::default();
        registry.publish("answer", Arc::new(42_u32));
        assert_eq!(registry.get::<u32>("answer").map(|v| *v), Some(42));
        assert!(registry.get::<String>("answer").is_none());
        assert!(registry.get::<u32>("missing").is_none());
    }
}
