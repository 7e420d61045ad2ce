//! Render State

use crate::geometry::*;
use crate::pbrt::*;
use crate::rng::RNG;
use crate::scene::ElementId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of unique owner ids for per-thread context slots.
static NEXT_CONTEXT_OWNER: AtomicUsize = AtomicUsize::new(1);

/// Returns an id that no other caller of this function receives. Lights use
/// it to key their scratch data inside a `Context`.
pub fn next_context_owner() -> usize {
    NEXT_CONTEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// Per-thread scratch storage keyed by owner and type.
///
/// Values are taken out for the duration of a call and stored back when
/// done, so an owner never holds a borrow of the render state while it
/// recurses into the scene.
#[derive(Default)]
pub struct Context {
    slots: HashMap<(usize, TypeId), Box<dyn Any + Send>>,
}

impl Context {
    /// Remove and return the value stored for `owner`, if any.
    ///
    /// * `owner` - Owner id from `next_context_owner()`.
    pub fn take<T: Any + Send>(&mut self, owner: usize) -> Option<Box<T>> {
        self.slots
            .remove(&(owner, TypeId::of::<T>()))
            .and_then(|b| b.downcast::<T>().ok())
    }

    /// Store a value for `owner`, replacing any previous value of the same
    /// type.
    ///
    /// * `owner` - Owner id from `next_context_owner()`.
    /// * `value` - The value.
    pub fn store<T: Any + Send>(&mut self, owner: usize, value: Box<T>) {
        self.slots.insert((owner, TypeId::of::<T>()), value);
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Mutable per-thread rendering state carried along a camera ray and all of
/// the secondary rays spawned from it.
pub struct RenderState {
    /// Linear index of the pixel being shaded.
    pub pixel: i64,

    /// Recursion depth of the current ray.
    pub ray_level: usize,

    /// Product of the sample counts of enclosing hemisphere integrations.
    pub ray_division: usize,

    /// Distance travelled from the camera to the current shading point.
    pub traveled: Float,

    /// Screen position of the current pixel in [-1, 1]².
    pub screen_pos: Point2f,

    /// Scene element to ignore on the next intersection query.
    pub skip: Option<ElementId>,

    /// Scratch data owned by lights.
    pub context: Context,

    /// Random number generator.
    pub rng: RNG,
}

impl RenderState {
    /// Create a new `RenderState` using the given generator.
    ///
    /// * `rng` - Random number generator.
    pub fn new(rng: RNG) -> Self {
        Self {
            pixel: -1,
            ray_level: 0,
            ray_division: 1,
            traveled: 0.0,
            screen_pos: Point2f::default(),
            skip: None,
            context: Context::default(),
            rng,
        }
    }

    /// Reset the per-ray fields for a new camera sample.
    ///
    /// * `pixel`      - Linear pixel index.
    /// * `screen_pos` - Screen position in [-1, 1]².
    pub fn start_pixel(&mut self, pixel: i64, screen_pos: Point2f) {
        self.pixel = pixel;
        self.screen_pos = screen_pos;
        self.ray_level = 0;
        self.ray_division = 1;
        self.traveled = 0.0;
        self.skip = None;
    }

    /// Returns a uniformly distributed value in [0, 1).
    pub fn random(&mut self) -> Float {
        self.rng.uniform_float()
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(RNG::unique())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_take_restores_ownership() {
        let a = next_context_owner();
        let b = next_context_owner();
        assert_ne!(a, b);

        let mut ctx = Context::default();
        ctx.store(a, Box::new(5_u32));
        ctx.store(b, Box::new(String::from("x")));
        assert_eq!(ctx.len(), 2);

        assert!(ctx.take::<String>(a).is_none());
        let v = ctx.take::<u32>(a).unwrap();
        assert_eq!(*v, 5);
        assert!(ctx.take::<u32>(a).is_none());

        ctx.store(a, v);
        assert_eq!(ctx.take::<u32>(a).map(|v| *v), Some(5));
    }

    #[test]
    fn start_pixel_resets_ray() {
        let mut state = RenderState::new(RNG::new(0));
        state.ray_level = 3;
        state.ray_division = 16;
        state.skip = Some(2);
        state.start_pixel(7, Point2f::new(0.5, -0.5));
        assert_eq!(state.pixel, 7);
        assert_eq!(state.ray_level, 0);
        assert_eq!(state.ray_division, 1);
        assert!(state.skip.is_none());
    }
}
