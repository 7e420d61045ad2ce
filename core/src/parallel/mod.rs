//! Parallel helpers

mod atomic_float;

// Re-export
pub use atomic_float::*;
