//! Point Light Source

use photon_core::geometry::*;
use photon_core::light::*;
use photon_core::paramset::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::rng::*;
use photon_core::sampling::*;
use photon_core::scene::*;
use photon_core::shader::*;
use photon_core::spectrum::*;

/// Isotropic point light source that emits the same amount of light in all
/// directions.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// Position.
    pub from: Point3f,

    /// Intensity (color scaled by power).
    pub color: Spectrum,

    /// Whether shadows are tested.
    pub cast_shadows: bool,
}

impl PointLight {
    /// Returns a new `PointLight`.
    ///
    /// * `from`         - Position.
    /// * `color`        - Light color.
    /// * `power`        - Scale applied to `color`.
    /// * `cast_shadows` - Whether shadows are tested.
    pub fn new(from: Point3f, color: Spectrum, power: Float, cast_shadows: bool) -> Self {
        Self {
            from,
            color: color * power,
            cast_shadows,
        }
    }
}

impl Light for PointLight {
    fn illuminate(&self, state: &mut RenderState, scene: &dyn Scene, sp: &SurfacePoint, eye: &Vector3f) -> Spectrum {
        let l = self.from - sp.p;
        let dist2 = l.length_squared();
        let inv_dist2 = if dist2 != 0.0 { 1.0 / dist2 } else { 0.0 };

        if self.cast_shadows && scene.is_shadowed(state, sp, &self.from) {
            return Spectrum::ZERO;
        }
        let energy = Energy::new(l.normalize_or_zero(), self.color * inv_dist2);
        sp.shader.from_light(state, sp, &energy, eye)
    }

    fn emitter(&self, _max_samples: usize) -> Option<Box<dyn Emitter>> {
        Some(Box::new(PointEmitter::new(self.from, self.color)))
    }
}

impl From<&ParamSet> for PointLight {
    /// Create a `PointLight` from given parameter set.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let from = params.find_one_point3f("from", Point3f::default());
        let color = params.find_one_spectrum("color", Spectrum::ONE);
        let power = params.find_one_float("power", 1.0);
        let cast_shadows = params.find_one_bool("cast_shadows", true);
        Self::new(from, color, power, cast_shadows)
    }
}

/// Emits photons uniformly over the sphere from a point.
#[derive(Clone, Debug)]
pub struct PointEmitter {
    /// Position.
    from: Point3f,

    /// Total emitted color.
    color: Spectrum,

    /// Color carried by each photon.
    photon_color: Spectrum,
}

impl PointEmitter {
    /// Returns a new `PointEmitter`.
    ///
    /// * `from`  - Position.
    /// * `color` - Total emitted color.
    pub fn new(from: Point3f, color: Spectrum) -> Self {
        Self {
            from,
            color,
            photon_color: color,
        }
    }
}

impl Emitter for PointEmitter {
    fn num_samples(&mut self, n: usize) {
        self.photon_color = self.color / max(n, 1) as Float;
    }

    fn get_direction(&self, _i: usize, rng: &mut RNG) -> (Point3f, Vector3f, Spectrum) {
        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        (self.from, uniform_sample_sphere(&u), self.photon_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use std::sync::Arc;

    #[test]
    fn from_params() {
        let mut params = ParamSet::new();
        params.add_point3f("from", &[Point3f::new(0.0, 0.0, 2.0)]);
        params.add_float("power", &[4.0]);
        let light = PointLight::from(&params);
        assert_eq!(light.from, Point3f::new(0.0, 0.0, 2.0));
        assert_eq!(light.color, Spectrum::new(4.0));
        assert!(light.cast_shadows);
    }

    #[test]
    fn emitter_splits_energy() {
        let light = PointLight::new(Point3f::ORIGIN, Spectrum::ONE, 100.0, true);
        let mut emitter = light.emitter(10).unwrap();
        emitter.num_samples(10);
        let mut rng = RNG::new(5);
        let (from, dir, color) = emitter.get_direction(0, &mut rng);
        assert_eq!(from, Point3f::ORIGIN);
        assert!(approx_eq!(f32, dir.length(), 1.0, epsilon = 1e-5));
        assert_eq!(color, Spectrum::new(10.0));
        assert!(!emitter.store_direct());
    }

    #[test]
    fn inverse_square_falloff() {
        let mut scene = SimpleScene::new(Spectrum::ZERO);
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::ONE, Spectrum::ZERO));
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-1.0, -1.0, 0.0),
                edge_u: Vector3f::new(2.0, 0.0, 0.0),
                edge_v: Vector3f::new(0.0, 2.0, 0.0),
            },
            ObjectProperties::default(),
            shader,
        );
        let mut state = RenderState::new(RNG::new(0));
        let sp = scene
            .first_hit(&state, &Point3f::new(0.0, 0.0, 1.0), &Vector3f::new(0.0, 0.0, -1.0), false)
            .unwrap();

        let near = PointLight::new(Point3f::new(0.0, 0.0, 1.0), Spectrum::ONE, 1.0, true);
        let far = PointLight::new(Point3f::new(0.0, 0.0, 2.0), Spectrum::ONE, 1.0, true);
        let eye = Vector3f::Z_AXIS;
        let a = near.illuminate(&mut state, &scene, &sp, &eye);
        let b = far.illuminate(&mut state, &scene, &sp, &eye);
        assert!(approx_eq!(f32, a[0], 1.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, b[0], 0.25, epsilon = 1e-4));
    }
}
