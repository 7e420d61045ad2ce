//! Integrators

#[macro_use]
extern crate log;

mod cache_proxy;
mod light_cache;
mod path;
mod renderer;

// Re-export.
pub use cache_proxy::*;
pub use light_cache::*;
pub use path::*;
pub use renderer::*;
