//! Shader

use crate::geometry::*;
use crate::render_state::*;
use crate::scene::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Light energy arriving at a surface point from a direction.
#[derive(Copy, Clone, Debug, Default)]
pub struct Energy {
    /// Unit direction towards the source, or the receiving normal for
    /// radiosity contributions.
    pub dir: Vector3f,

    /// Arriving color.
    pub color: Spectrum,
}

impl Energy {
    /// Create a new `Energy`.
    ///
    /// * `dir`   - Direction.
    /// * `color` - Color.
    pub fn new(dir: Vector3f, color: Spectrum) -> Self {
        Self { dir, color }
    }
}

/// Surface response interface.
pub trait Shader: Send + Sync {
    /// Returns the diffuse reflectance at the surface point.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `eye`   - Direction towards the viewer.
    fn diffuse(&self, state: &RenderState, sp: &SurfacePoint, eye: &Vector3f) -> Spectrum;

    /// Returns the radiance reflected towards `eye` from a direct light.
    ///
    /// * `state`  - Render state.
    /// * `sp`     - Surface point.
    /// * `energy` - Energy arriving from the light.
    /// * `eye`    - Direction towards the viewer.
    fn from_light(&self, state: &RenderState, sp: &SurfacePoint, energy: &Energy, eye: &Vector3f) -> Spectrum;

    /// Returns the radiance reflected towards `eye` from already integrated
    /// irradiance, plus any emission.
    ///
    /// * `state`  - Render state.
    /// * `sp`     - Surface point.
    /// * `energy` - Integrated irradiance.
    /// * `eye`    - Direction towards the viewer.
    fn from_radiosity(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        energy: &Energy,
        eye: &Vector3f,
    ) -> Spectrum;
}

/// Atomic reference counted `Shader`.
pub type ArcShader = Arc<dyn Shader>;

/// Lambertian shader with optional emission.
#[derive(Clone, Debug)]
pub struct DiffuseShader {
    /// Diffuse color.
    pub color: Spectrum,

    /// Emitted radiance.
    pub emit: Spectrum,
}

impl DiffuseShader {
    /// Create a new `DiffuseShader`.
    ///
    /// * `color` - Diffuse color.
    /// * `emit`  - Emitted radiance.
    pub fn new(color: Spectrum, emit: Spectrum) -> Self {
        Self { color, emit }
    }
}

impl Shader for DiffuseShader {
    fn diffuse(&self, _state: &RenderState, _sp: &SurfacePoint, _eye: &Vector3f) -> Spectrum {
        self.color
    }

    fn from_light(&self, _state: &RenderState, sp: &SurfacePoint, energy: &Energy, eye: &Vector3f) -> Spectrum {
        let n = face_forward(&sp.ng, &sp.n, eye);
        let cos = n.dot(&energy.dir);
        if cos <= 0.0 {
            Spectrum::ZERO
        } else {
            self.color * energy.color * cos
        }
    }

    fn from_radiosity(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        energy: &Energy,
        _eye: &Vector3f,
    ) -> Spectrum {
        self.emit + self.color * energy.color
    }
}
