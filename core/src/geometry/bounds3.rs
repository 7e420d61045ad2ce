//! 3-D Axis Aligned Bounding Boxes.

use super::Point3f;
use crate::pbrt::*;

/// 3-D axis aligned bounding box over `Float` points.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds3f {
    /// Minimum corner.
    pub p_min: Point3f,

    /// Maximum corner.
    pub p_max: Point3f,
}

impl Bounds3f {
    /// Creates a bounding box enclosing two points.
    ///
    /// * `p1` - First point.
    /// * `p2` - Second point.
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns the bounding box of a set of points, or `None` when empty.
    ///
    /// * `points` - The points.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3f>,
    {
        points.into_iter().fold(None, |b, p| match b {
            None => Some(Self::new(p, p)),
            Some(b) => Some(b.union(&p)),
        })
    }

    /// Returns the bounding box grown to include a point.
    ///
    /// * `p` - The point.
    pub fn union(&self, p: &Point3f) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Returns the bounding box padded by `delta` in every direction.
    ///
    /// * `delta` - Padding.
    pub fn expand(&self, delta: Float) -> Self {
        Self {
            p_min: Point3f::new(self.p_min.x - delta, self.p_min.y - delta, self.p_min.z - delta),
            p_max: Point3f::new(self.p_max.x + delta, self.p_max.y + delta, self.p_max.z + delta),
        }
    }

    /// Returns true when the point lies inside the box (closed interval).
    ///
    /// * `p` - The point.
    pub fn inside(&self, p: &Point3f) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }

    /// Returns the axis with the largest extent.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.p_max - self.p_min;
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_points() {
        let b = Bounds3f::enclosing(vec![
            Point3f::new(0.0, 1.0, 2.0),
            Point3f::new(-1.0, 3.0, 0.0),
            Point3f::new(2.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(b.p_min, Point3f::new(-1.0, 0.0, 0.0));
        assert_eq!(b.p_max, Point3f::new(2.0, 3.0, 2.0));
        assert_eq!(b.maximum_extent(), Axis::X);
        assert!(Bounds3f::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn expanded_box_contains_nearby_point() {
        let b = Bounds3f::new(Point3f::ORIGIN, Point3f::new(1.0, 1.0, 1.0));
        let p = Point3f::new(1.2, 0.5, 0.5);
        assert!(!b.inside(&p));
        assert!(b.expand(0.25).inside(&p));
    }
}
