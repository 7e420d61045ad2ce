//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

pub mod app;
pub mod camera;
pub mod error;
pub mod film;
pub mod geometry;
pub mod image_io;
pub mod light;
pub mod low_discrepancy;
pub mod parallel;
pub mod paramset;
pub mod pbrt;
pub mod render_state;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod shader;
pub mod spectrum;
