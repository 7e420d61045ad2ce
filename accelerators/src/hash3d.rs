//! Sparse 3-D Hash Grid

use photon_core::geometry::*;
use photon_core::pbrt::*;
use std::collections::btree_map::{self, BTreeMap};

/// Integer cell coordinates.
pub type CellKey = (i32, i32, i32);

/// Sparse uniform grid of cubic cells holding one value each. Cells are
/// created on demand.
#[derive(Clone, Debug)]
pub struct Hash3D<T> {
    /// Cell edge length.
    cell_size: Float,

    /// Reciprocal of the cell edge length.
    inv_cell_size: Float,

    /// Cells.
    cells: BTreeMap<CellKey, T>,
}

impl<T> Hash3D<T> {
    /// Create a new empty `Hash3D`.
    ///
    /// * `cell_size` - Cell edge length.
    pub fn new(cell_size: Float) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: BTreeMap::new(),
        }
    }

    /// Returns the cell edge length.
    pub fn cell_size(&self) -> Float {
        self.cell_size
    }

    /// Returns the key of the cell containing `p`.
    ///
    /// * `p` - The point.
    pub fn cell_of(&self, p: &Point3f) -> CellKey {
        let c = |v: Float| (v * self.inv_cell_size).floor() as i32;
        (c(p.x), c(p.y), c(p.z))
    }

    /// Returns the value of the cell containing `p`, if the cell exists.
    ///
    /// * `p` - The point.
    pub fn get(&self, p: &Point3f) -> Option<&T> {
        self.cells.get(&self.cell_of(p))
    }

    /// Returns the value of a cell, if it exists.
    ///
    /// * `key` - Cell key.
    pub fn get_cell(&self, key: &CellKey) -> Option<&T> {
        self.cells.get(key)
    }

    /// Returns the mutable value of a cell, if it exists.
    ///
    /// * `key` - Cell key.
    pub fn get_cell_mut(&mut self, key: &CellKey) -> Option<&mut T> {
        self.cells.get_mut(key)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell exists.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterate over cells.
    pub fn iter(&self) -> btree_map::Iter<'_, CellKey, T> {
        self.cells.iter()
    }

    /// Iterate mutably over cells.
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, CellKey, T> {
        self.cells.iter_mut()
    }
}

impl<T: Default> Hash3D<T> {
    /// Returns the value of the cell containing `p`, creating it if needed.
    ///
    /// * `p` - The point.
    pub fn find_box(&mut self, p: &Point3f) -> &mut T {
        let key = self.cell_of(p);
        self.cells.entry(key).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_floor_coordinates() {
        let hash: Hash3D<u32> = Hash3D::new(0.5);
        assert_eq!(hash.cell_of(&Point3f::new(0.0, 0.49, 0.5)), (0, 0, 1));
        assert_eq!(hash.cell_of(&Point3f::new(-0.01, -0.5, -0.51)), (-1, -1, -2));
    }

    #[test]
    fn find_box_creates_once() {
        let mut hash: Hash3D<u32> = Hash3D::new(1.0);
        let p = Point3f::new(2.5, 0.1, -3.2);
        *hash.find_box(&p) += 1;
        *hash.find_box(&Point3f::new(2.9, 0.9, -3.9)) += 1;
        assert_eq!(hash.len(), 1);
        assert_eq!(hash.get(&p), Some(&2));
        assert!(hash.get(&Point3f::ORIGIN).is_none());
        hash.clear();
        assert!(hash.is_empty());
    }

    #[test]
    fn non_positive_cell_size_falls_back() {
        let hash: Hash3D<u32> = Hash3D::new(0.0);
        assert_eq!(hash.cell_size(), 1.0);
    }
}
