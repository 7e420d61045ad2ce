//! Spatial search structures for points, photons and cached samples.

#[macro_use]
extern crate log;

mod hash3d;
mod photon_map;
mod point_tree;

// Re-export
pub use hash3d::*;
pub use photon_map::*;
pub use point_tree::*;
