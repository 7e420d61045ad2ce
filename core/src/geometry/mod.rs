//! Geometry

mod bounds3;
mod common;
mod point2;
mod point3;
mod vector3;

// Re-export
pub use bounds3::*;
pub use common::*;
pub use point2::*;
pub use point3::*;
pub use vector3::*;

/// Dot product interface.
pub trait Dot<T> {
    type Output;

    /// Returns the dot product.
    ///
    /// * `other` - The other vector.
    fn dot(&self, other: &T) -> Self::Output;
}

/// Cross product interface.
pub trait Cross<T> {
    type Output;

    /// Returns the cross product.
    ///
    /// * `other` - The other vector.
    fn cross(&self, other: &T) -> Self::Output;
}
