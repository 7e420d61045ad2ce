//! Axis

/// Coordinate axis used to pick split planes and hash cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// The three axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl From<usize> for Axis {
    fn from(i: usize) -> Self {
        match i % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }
}

impl From<Axis> for usize {
    fn from(axis: Axis) -> usize {
        axis as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from(usize::from(axis)), axis);
        }
        assert_eq!(Axis::from(4), Axis::Y);
    }
}
