//! Simple Scene

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Geometric shape of a scene element.
#[derive(Copy, Clone, Debug)]
pub enum Shape {
    /// Parallelogram spanned by two edges from a corner.
    Quad {
        corner: Point3f,
        edge_u: Vector3f,
        edge_v: Vector3f,
    },

    /// Sphere.
    Sphere { center: Point3f, radius: Float },
}

impl Shape {
    /// Returns the ray parameter of the closest intersection further than
    /// `MIN_RAYDIST` along the ray.
    ///
    /// * `from` - Ray origin.
    /// * `dir`  - Unit ray direction.
    fn intersect(&self, from: &Point3f, dir: &Vector3f) -> Option<Float> {
        match *self {
            Shape::Quad { corner, edge_u, edge_v } => {
                let n = edge_u.cross(&edge_v);
                let denom = n.dot(dir);
                if denom == 0.0 {
                    return None;
                }
                let t = (corner - *from).dot(&n) / denom;
                if t <= MIN_RAYDIST {
                    return None;
                }
                let d = (*from + *dir * t) - corner;
                let a = d.dot(&edge_u) / edge_u.length_squared();
                let b = d.dot(&edge_v) / edge_v.length_squared();
                if (0.0..=1.0).contains(&a) && (0.0..=1.0).contains(&b) {
                    Some(t)
                } else {
                    None
                }
            }
            Shape::Sphere { center, radius } => {
                let oc = *from - center;
                let b = oc.dot(dir);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let sq = disc.sqrt();
                [-b - sq, -b + sq].into_iter().find(|&t| t > MIN_RAYDIST)
            }
        }
    }

    /// Returns the outward normal at a point on the shape.
    ///
    /// * `p` - Point on the surface.
    fn normal(&self, p: &Point3f) -> Vector3f {
        match *self {
            Shape::Quad { edge_u, edge_v, .. } => edge_u.cross(&edge_v).normalize(),
            Shape::Sphere { center, .. } => (*p - center).normalize(),
        }
    }
}

/// A shape with its surface description.
#[derive(Clone)]
pub struct Element {
    /// Shape.
    pub shape: Shape,

    /// Global illumination flags.
    pub object: ObjectProperties,

    /// Surface shader.
    pub shader: ArcShader,
}

/// Brute force scene of quads and spheres with a constant background.
pub struct SimpleScene {
    /// Scene elements. Their indices are the element ids.
    elements: Vec<Element>,

    /// Lights.
    lights: Vec<ArcLight>,

    /// Constant background radiance.
    background: Spectrum,

    /// World-space size of a pixel at unit distance.
    world_resolution: Float,

    /// Image width over height.
    aspect_ratio: Float,

    /// Preparatory pass request.
    repeat_first: AtomicBool,

    /// Published artifacts.
    registry: ArtifactRegistry,
}

impl SimpleScene {
    /// Create a new empty `SimpleScene`.
    ///
    /// * `background` - Constant background radiance.
    pub fn new(background: Spectrum) -> Self {
        Self {
            elements: vec![],
            lights: vec![],
            background,
            world_resolution: 1.0,
            aspect_ratio: 1.0,
            repeat_first: AtomicBool::new(false),
            registry: ArtifactRegistry::default(),
        }
    }

    /// Add an element and return its id.
    ///
    /// * `shape`  - Shape.
    /// * `object` - Global illumination flags.
    /// * `shader` - Surface shader.
    pub fn add(&mut self, shape: Shape, object: ObjectProperties, shader: ArcShader) -> ElementId {
        self.elements.push(Element { shape, object, shader });
        self.elements.len() - 1
    }

    /// Add a light.
    ///
    /// * `light` - The light.
    pub fn add_light(&mut self, light: ArcLight) {
        self.lights.push(light);
    }

    /// Set camera dependent values.
    ///
    /// * `world_resolution` - World-space size of a pixel at unit distance.
    /// * `aspect_ratio`     - Image width over height.
    pub fn set_camera(&mut self, world_resolution: Float, aspect_ratio: Float) {
        self.world_resolution = world_resolution;
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the closest element hit by the ray and the ray parameter.
    /// Quads equal to `skip` are ignored; spheres are always tested so
    /// refracted rays can leave them.
    ///
    /// * `from`   - Ray origin.
    /// * `dir`    - Unit ray direction.
    /// * `skip`   - Element to ignore.
    /// * `shadow` - Only consider shadow casting objects.
    fn closest(&self, from: &Point3f, dir: &Vector3f, skip: Option<ElementId>, shadow: bool) -> Option<(ElementId, Float)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !shadow || e.object.cast_shadows)
            .filter(|(i, e)| !(Some(*i) == skip && matches!(e.shape, Shape::Quad { .. })))
            .filter_map(|(i, e)| e.shape.intersect(from, dir).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl Scene for SimpleScene {
    fn first_hit(&self, state: &RenderState, from: &Point3f, dir: &Vector3f, shadow: bool) -> Option<SurfacePoint> {
        let (id, t) = self.closest(from, dir, state.skip, shadow)?;
        let element = &self.elements[id];
        let p = *from + *dir * t;
        let n = element.shape.normal(&p);
        let (nu, nv) = coordinate_system(&n);
        Some(SurfacePoint {
            p,
            n,
            ng: n,
            nd: n,
            nu,
            nv,
            z: t,
            origin: id,
            object: element.object,
            shader: Arc::clone(&element.shader),
        })
    }

    fn is_shadowed(&self, _state: &RenderState, sp: &SurfacePoint, to: &Point3f) -> bool {
        let mut dir = *to - sp.p;
        let dist = dir.norm_len();
        if dist <= MIN_RAYDIST {
            return false;
        }
        match self.closest(&sp.p, &dir, Some(sp.origin), true) {
            Some((_, t)) => t < dist - MIN_RAYDIST,
            None => false,
        }
    }

    fn is_shadowed_dir(&self, _state: &RenderState, sp: &SurfacePoint, dir: &Vector3f) -> bool {
        self.closest(&sp.p, dir, Some(sp.origin), true).is_some()
    }

    fn background(&self, _dir: &Vector3f, _state: &RenderState, _indirect: bool) -> Spectrum {
        self.background
    }

    fn lights(&self) -> &[ArcLight] {
        &self.lights
    }

    fn light(&self, state: &mut RenderState, sp: &SurfacePoint, from: &Point3f, indirect: bool) -> Spectrum {
        gather_light(self, state, sp, from, indirect)
    }

    fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    fn world_resolution(&self) -> Float {
        self.world_resolution
    }

    fn aspect_ratio(&self) -> Float {
        self.aspect_ratio
    }

    fn set_repeat_first(&self) {
        self.repeat_first.store(true, Ordering::SeqCst);
    }

    fn take_repeat_first(&self) -> bool {
        self.repeat_first.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RNG;

    fn floor_scene() -> SimpleScene {
        let mut scene = SimpleScene::new(Spectrum::new(0.5));
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.8), Spectrum::ZERO));
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-1.0, -1.0, 0.0),
                edge_u: Vector3f::new(2.0, 0.0, 0.0),
                edge_v: Vector3f::new(0.0, 2.0, 0.0),
            },
            ObjectProperties::default(),
            Arc::clone(&shader),
        );
        scene.add(
            Shape::Sphere {
                center: Point3f::new(0.0, 0.0, 2.0),
                radius: 0.5,
            },
            ObjectProperties::default(),
            shader,
        );
        scene
    }

    #[test]
    fn hits_closest_element() {
        let scene = floor_scene();
        let state = RenderState::new(RNG::new(0));
        let down = Vector3f::new(0.0, 0.0, -1.0);

        let hit = scene.first_hit(&state, &Point3f::new(0.0, 0.0, 5.0), &down, false).unwrap();
        assert_eq!(hit.origin, 1);
        assert!((hit.z - 2.5).abs() < 1e-4);

        let hit = scene.first_hit(&state, &Point3f::new(0.9, 0.9, 5.0), &down, false).unwrap();
        assert_eq!(hit.origin, 0);
        assert!((hit.p.z).abs() < 1e-4);

        assert!(scene.first_hit(&state, &Point3f::new(3.0, 0.0, 5.0), &down, false).is_none());
    }

    #[test]
    fn skip_ignores_quad() {
        let scene = floor_scene();
        let mut state = RenderState::new(RNG::new(0));
        state.skip = Some(0);
        let down = Vector3f::new(0.0, 0.0, -1.0);
        assert!(scene.first_hit(&state, &Point3f::new(0.9, 0.9, 5.0), &down, false).is_none());
    }

    #[test]
    fn shadow_by_sphere() {
        let scene = floor_scene();
        let state = RenderState::new(RNG::new(0));
        let down = Vector3f::new(0.0, 0.0, -1.0);
        let sp = scene.first_hit(&state, &Point3f::new(0.9, 0.9, 5.0), &down, false).unwrap();
        assert!(!scene.is_shadowed(&state, &sp, &Point3f::new(0.9, 0.9, 5.0)));
        assert!(scene.is_shadowed(&state, &sp, &Point3f::new(-0.9, -0.9, 4.0)));
    }

    #[test]
    fn repeat_flag_is_consumed() {
        let scene = floor_scene();
        assert!(!scene.take_repeat_first());
        scene.set_repeat_first();
        assert!(scene.take_repeat_first());
        assert!(!scene.take_repeat_first());
    }
}
