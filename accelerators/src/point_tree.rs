//! Point KD Tree

use photon_core::geometry::*;
use photon_core::pbrt::*;
use order_stat::kth_by;
use std::cmp::Ordering;

/// Default maximum number of points in a leaf node.
pub const DEFAULT_LEAF_SIZE: usize = 8;

/// A point and the caller's index for it.
#[derive(Copy, Clone, Debug)]
struct TreePoint {
    p: Point3f,
    index: usize,
}

/// Tree node.
#[derive(Clone, Debug)]
enum PointKdNode {
    /// Leaf node holding `points[start..end]`.
    Leaf { bounds: Bounds3f, start: usize, end: usize },

    /// Interior node with two children.
    Interior {
        bounds: Bounds3f,
        left: usize,
        right: usize,
    },
}

impl PointKdNode {
    fn bounds(&self) -> &Bounds3f {
        match self {
            PointKdNode::Leaf { bounds, .. } => bounds,
            PointKdNode::Interior { bounds, .. } => bounds,
        }
    }
}

/// Median split kd-tree over a static set of points used for fixed radius
/// searches.
#[derive(Clone, Debug, Default)]
pub struct PointKdTree {
    /// Points reordered so every leaf holds a contiguous range.
    points: Vec<TreePoint>,

    /// Nodes. The root is the first node.
    nodes: Vec<PointKdNode>,
}

impl PointKdTree {
    /// Build a tree over points. The index of a point in `points` is what
    /// searches report.
    ///
    /// * `points`    - Points.
    /// * `leaf_size` - Maximum number of points per leaf.
    pub fn new(points: &[Point3f], leaf_size: usize) -> Self {
        let mut tree = Self {
            points: points.iter().enumerate().map(|(index, &p)| TreePoint { p, index }).collect(),
            nodes: Vec::with_capacity(2 * points.len() / leaf_size.max(1) + 1),
        };
        let n = tree.points.len();
        if n > 0 {
            tree.build(0, n, leaf_size.max(1));
        }
        debug!("Built point tree with {} points and {} nodes", n, tree.nodes.len());
        tree
    }

    /// Recursively build the subtree for `points[start..end]` and return the
    /// node index.
    ///
    /// * `start`     - Starting index.
    /// * `end`       - Ending index + 1.
    /// * `leaf_size` - Maximum number of points per leaf.
    fn build(&mut self, start: usize, end: usize, leaf_size: usize) -> usize {
        let bounds = Bounds3f::enclosing(self.points[start..end].iter().map(|tp| tp.p)).unwrap_or_default();

        let node = self.nodes.len();
        if end - start <= leaf_size {
            self.nodes.push(PointKdNode::Leaf { bounds, start, end });
            return node;
        }

        // Reserve the slot; children are filled in once built.
        self.nodes.push(PointKdNode::Leaf { bounds, start, end });

        let axis = bounds.maximum_extent();
        let mid = (start + end) / 2;
        kth_element_by(&mut self.points[start..end], mid - start, |a, b| {
            a.p[axis].partial_cmp(&b.p[axis]).unwrap_or(Ordering::Equal)
        });

        let left = self.build(start, mid, leaf_size);
        let right = self.build(mid, end, leaf_size);
        self.nodes[node] = PointKdNode::Interior { bounds, left, right };
        node
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the tree has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Visit every point within `radius` of `p`, passing the point's index
    /// and its distance to `p`.
    ///
    /// * `p`      - Search center.
    /// * `radius` - Search radius.
    /// * `f`      - Visitor.
    pub fn for_each_within<F>(&self, p: &Point3f, radius: Float, mut f: F)
    where
        F: FnMut(usize, Float),
    {
        if self.nodes.is_empty() {
            return;
        }

        let mut to_visit = vec![0_usize];
        while let Some(node) = to_visit.pop() {
            let node = &self.nodes[node];
            if !node.bounds().expand(radius).inside(p) {
                continue;
            }
            match *node {
                PointKdNode::Leaf { start, end, .. } => {
                    for tp in self.points[start..end].iter() {
                        let d = tp.p.distance(p);
                        if d <= radius {
                            f(tp.index, d);
                        }
                    }
                }
                PointKdNode::Interior { left, right, .. } => {
                    to_visit.push(right);
                    to_visit.push(left);
                }
            }
        }
    }
}

/// Partition `v` so the k^th element is in its sorted position with smaller
/// elements before and larger elements after it.
///
/// * `v` - Slice to partition.
/// * `k` - Index of the element to place.
/// * `f` - Ordering.
fn kth_element_by<T, F>(v: &mut [T], k: usize, f: F)
where
    F: Fn(&T, &T) -> Ordering,
{
    if k < v.len() {
        kth_by(v, k, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(points: &[Point3f], p: &Point3f, radius: Float) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, q)| q.distance(p) <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn empty_tree() {
        let tree = PointKdTree::new(&[], DEFAULT_LEAF_SIZE);
        assert!(tree.is_empty());
        let mut count = 0;
        tree.for_each_within(&Point3f::ORIGIN, 10.0, |_, _| count += 1);
        assert_eq!(count, 0);
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            coords in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0), 0..200),
            center in (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0),
            radius in 0.0f32..8.0,
            leaf_size in 1usize..10,
        ) {
            let points: Vec<Point3f> = coords.iter().map(|&(x, y, z)| Point3f::new(x, y, z)).collect();
            let p = Point3f::new(center.0, center.1, center.2);
            let tree = PointKdTree::new(&points, leaf_size);
            prop_assert_eq!(tree.len(), points.len());

            let mut found = vec![];
            tree.for_each_within(&p, radius, |i, d| {
                found.push(i);
                assert!(d <= radius);
            });
            found.sort_unstable();
            prop_assert_eq!(found, brute_force(&points, &p, radius));
        }
    }
}
