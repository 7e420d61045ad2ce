//! Lights

#[macro_use]
extern crate log;

mod global_photon;
mod point;

// Re-export
pub use global_photon::*;
pub use point::*;
