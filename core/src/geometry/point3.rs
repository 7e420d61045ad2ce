//! 3-D Points

use super::Vector3;
use crate::pbrt::*;
use num_traits::Num;
use std::fmt;
use std::ops::{Add, AddAssign, Index, Sub};

/// A 3-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D point containing `Float` values.
pub type Point3f = Point3<Float>;

impl Point3f {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Returns the distance to another point.
    ///
    /// * `p` - The other point.
    pub fn distance(&self, p: &Self) -> Float {
        (*self - *p).length()
    }

    /// Returns the component-wise minimum with another point.
    ///
    /// * `p` - The other point.
    pub fn min(&self, p: &Self) -> Self {
        Self::new(min(self.x, p.x), min(self.y, p.y), min(self.z, p.z))
    }

    /// Returns the component-wise maximum with another point.
    ///
    /// * `p` - The other point.
    pub fn max(&self, p: &Self) -> Self {
        Self::new(max(self.x, p.x), max(self.y, p.y), max(self.z, p.z))
    }
}

impl<T: Num> Point3<T> {
    /// Creates a new 3-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Num> Add<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn add(self, v: Vector3<T>) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl<T: Num + Copy> AddAssign<Vector3<T>> for Point3<T> {
    fn add_assign(&mut self, v: Vector3<T>) {
        *self = Self::new(self.x + v.x, self.y + v.y, self.z + v.z);
    }
}

impl<T: Num> Sub for Point3<T> {
    type Output = Vector3<T>;

    fn sub(self, p: Self) -> Vector3<T> {
        Vector3::new(self.x - p.x, self.y - p.y, self.z - p.z)
    }
}

impl<T: Num> Sub<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn sub(self, v: Vector3<T>) -> Self {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<T> Index<Axis> for Point3<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl<T: Num> From<Vector3<T>> for Point3<T> {
    fn from(v: Vector3<T>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl<T: fmt::Display> fmt::Display for Point3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn offset_round_trip(x in -10.0..10.0f32, y in -10.0..10.0f32, z in -10.0..10.0f32) {
            let p = Point3f::new(x, y, z);
            let q = Point3f::new(1.0, 2.0, 3.0);
            let v = q - p;
            let r = p + v;
            prop_assert!(r.distance(&q) < 1e-4);
        }
    }
}
