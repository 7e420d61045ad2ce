//! Photon Map

use crate::point_tree::*;
use photon_core::geometry::*;
use photon_core::pbrt::*;
use photon_core::spectrum::*;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;
use std::sync::OnceLock;

/// Quantized polar angle marking an absent direction.
const NULL_THETA: u8 = 255;

/// Lookup tables for decoding quantized directions.
struct DirConverter {
    cos_theta: [Float; 255],
    sin_theta: [Float; 255],
    cos_phi: [Float; 256],
    sin_phi: [Float; 256],
}

impl DirConverter {
    fn new() -> Self {
        let mut conv = Self {
            cos_theta: [0.0; 255],
            sin_theta: [0.0; 255],
            cos_phi: [0.0; 256],
            sin_phi: [0.0; 256],
        };
        for i in 0..255 {
            let angle = i as Float * PI / 255.0;
            conv.cos_theta[i] = angle.cos();
            conv.sin_theta[i] = angle.sin();
        }
        for i in 0..256 {
            let angle = i as Float * TWO_PI / 256.0;
            conv.cos_phi[i] = angle.cos();
            conv.sin_phi[i] = angle.sin();
        }
        conv
    }
}

/// Returns the shared direction lookup tables.
fn dir_converter() -> &'static DirConverter {
    static DATA: OnceLock<DirConverter> = OnceLock::new();
    DATA.get_or_init(DirConverter::new)
}

/// Unit direction packed into two bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackedDir {
    theta: u8,
    phi: u8,
}

impl PackedDir {
    /// The absent direction.
    pub const NULL: Self = Self { theta: NULL_THETA, phi: 0 };

    /// Quantize a unit direction. A zero vector maps to `NULL`.
    ///
    /// * `dir` - Unit direction.
    pub fn from_vector(dir: &Vector3f) -> Self {
        if dir.is_null() {
            return Self::NULL;
        }
        let theta = (clamp(dir.z, -1.0, 1.0).acos() * (255.0 / PI)) as i32;
        let mut phi = (dir.y.atan2(dir.x) * (256.0 / TWO_PI)) as i32;
        if phi < 0 {
            phi += 256;
        }
        Self {
            theta: clamp(theta, 0, 254) as u8,
            phi: clamp(phi, 0, 255) as u8,
        }
    }

    /// Returns true for the absent direction.
    pub fn is_null(&self) -> bool {
        self.theta == NULL_THETA
    }

    /// Decode to a unit direction, or the zero vector for `NULL`.
    pub fn to_vector(&self) -> Vector3f {
        if self.is_null() {
            return Vector3f::ZERO;
        }
        let conv = dir_converter();
        let (t, p) = (self.theta as usize, self.phi as usize);
        Vector3f::new(
            conv.sin_theta[t] * conv.cos_phi[p],
            conv.sin_theta[t] * conv.sin_phi[p],
            conv.cos_theta[t],
        )
    }
}

/// Photon in flight during emission.
#[derive(Copy, Clone, Debug)]
pub struct RunningPhoton {
    pos: Point3f,
    last_pos: Point3f,
    color: Spectrum,
}

impl RunningPhoton {
    /// Create a new `RunningPhoton` at its emission point.
    ///
    /// * `color` - Carried energy.
    /// * `pos`   - Emission point.
    pub fn new(color: Spectrum, pos: Point3f) -> Self {
        Self {
            pos,
            last_pos: pos,
            color,
        }
    }

    /// Move the photon. The previous position is only remembered when the
    /// photon travelled farther than `bias`.
    ///
    /// * `p`    - New position.
    /// * `bias` - Minimum travel distance.
    pub fn position(&mut self, p: Point3f, bias: Float) {
        if self.pos.distance(&p) > bias {
            self.last_pos = self.pos;
        }
        self.pos = p;
    }

    /// Scale the carried energy.
    ///
    /// * `f` - Filter color.
    pub fn filter(&mut self, f: &Spectrum) {
        self.color *= *f;
    }

    /// Current position.
    pub fn pos(&self) -> Point3f {
        self.pos
    }

    /// Previous position.
    pub fn last_pos(&self) -> Point3f {
        self.last_pos
    }

    /// Carried energy.
    pub fn color(&self) -> Spectrum {
        self.color
    }
}

/// Photon stored in a map.
#[derive(Copy, Clone, Debug)]
pub struct StoredPhoton {
    /// Position.
    pub pos: Point3f,

    /// Energy.
    pub color: Spectrum,

    /// Incoming direction, pointing back towards where the photon came
    /// from.
    dir: PackedDir,
}

impl StoredPhoton {
    /// Create a new `StoredPhoton`.
    ///
    /// * `pos`   - Position.
    /// * `color` - Energy.
    /// * `dir`   - Unit incoming direction or zero.
    pub fn new(pos: Point3f, color: Spectrum, dir: &Vector3f) -> Self {
        Self {
            pos,
            color,
            dir: PackedDir::from_vector(dir),
        }
    }

    /// Returns the decoded direction, zero when absent.
    pub fn direction(&self) -> Vector3f {
        self.dir.to_vector()
    }

    /// Replace the direction.
    ///
    /// * `dir` - Unit direction or zero.
    pub fn set_direction(&mut self, dir: &Vector3f) {
        self.dir = PackedDir::from_vector(dir);
    }

    /// Returns true when no direction is stored.
    pub fn has_direction(&self) -> bool {
        !self.dir.is_null()
    }
}

impl Default for StoredPhoton {
    fn default() -> Self {
        Self {
            pos: Point3f::ORIGIN,
            color: Spectrum::ZERO,
            dir: PackedDir::NULL,
        }
    }
}

impl From<&RunningPhoton> for StoredPhoton {
    fn from(photon: &RunningPhoton) -> Self {
        let dir = (photon.last_pos() - photon.pos()).normalize_or_zero();
        Self::new(photon.pos(), photon.color(), &dir)
    }
}

/// A photon returned by a gather and its distance to the search center.
#[derive(Copy, Clone, Debug)]
pub struct FoundPhoton<'a> {
    /// The photon.
    pub photon: &'a StoredPhoton,

    /// Distance to the search center.
    pub dis: Float,
}

/// Photon store with a spatial index for nearest neighbour gathers.
#[derive(Clone, Debug)]
pub struct PhotonMap {
    /// Photons in insertion order.
    photons: Vec<StoredPhoton>,

    /// Spatial index, valid only when `updated` is true.
    tree: PointKdTree,

    /// Whether the tree reflects every stored photon.
    updated: bool,

    /// Largest radius a gather will search.
    max_radius: Float,
}

impl PhotonMap {
    /// Create a new empty `PhotonMap`.
    ///
    /// * `max_radius` - Largest search radius.
    pub fn new(max_radius: Float) -> Self {
        Self {
            photons: vec![],
            tree: PointKdTree::default(),
            updated: false,
            max_radius,
        }
    }

    /// Append a photon. The tree is stale until the next `build_tree()`.
    ///
    /// * `photon` - The photon.
    pub fn store(&mut self, photon: StoredPhoton) {
        self.photons.push(photon);
        self.updated = false;
    }

    /// Rebuild the spatial index over all stored photons.
    pub fn build_tree(&mut self) {
        let points: Vec<Point3f> = self.photons.iter().map(|ph| ph.pos).collect();
        self.tree = PointKdTree::new(&points, DEFAULT_LEAF_SIZE);
        self.updated = true;
    }

    /// Number of stored photons.
    pub fn count(&self) -> usize {
        self.photons.len()
    }

    /// Largest search radius.
    pub fn max_radius(&self) -> Float {
        self.max_radius
    }

    /// Stored photons in insertion order.
    pub fn photons(&self) -> &[StoredPhoton] {
        &self.photons
    }

    /// Returns true when the tree reflects every stored photon.
    pub fn is_ready(&self) -> bool {
        self.updated
    }

    /// Gather up to `k` photons closest to `p` whose direction satisfies
    /// `direction·n > min_cos`, farthest first.
    ///
    /// The search starts at `radius` and doubles while fewer than `k`
    /// photons were reached and the radius stays within the maximum. On
    /// return `radius` holds a radius suitable for the next nearby query.
    ///
    /// * `p`       - Search center.
    /// * `n`       - Surface normal.
    /// * `found`   - Output; cleared first.
    /// * `k`       - Maximum number of photons.
    /// * `radius`  - Initial search radius; updated.
    /// * `min_cos` - Minimum cosine between photon direction and `n`.
    pub fn gather<'a>(
        &'a self,
        p: &Point3f,
        n: &Vector3f,
        found: &mut Vec<FoundPhoton<'a>>,
        k: usize,
        radius: &mut Float,
        min_cos: Float,
    ) {
        found.clear();
        if *radius <= 0.0 {
            *radius = self.max_radius;
        }
        if !self.updated {
            return;
        }

        let mut heap: BinaryHeap<(OrderedFloat<Float>, usize)> = BinaryHeap::with_capacity(k + 1);
        let mut reached = 0;
        while *radius <= self.max_radius {
            heap.clear();
            reached = 0;
            self.tree.for_each_within(p, *radius, |i, d| {
                if self.photons[i].direction().dot(n) <= min_cos {
                    return;
                }
                reached += 1;
                if heap.len() < k {
                    heap.push((OrderedFloat(d), i));
                } else if heap.peek().map_or(false, |top| d < top.0 .0) {
                    heap.pop();
                    heap.push((OrderedFloat(d), i));
                }
            });

            if reached >= k {
                break;
            }
            *radius *= 2.0;
        }

        if reached > k && (k as Float / reached as Float) < 0.49 {
            *radius *= 0.95;
        }
        if *radius > self.max_radius {
            *radius = self.max_radius;
        }

        found.extend(heap.into_sorted_vec().into_iter().rev().map(|(d, i)| FoundPhoton {
            photon: &self.photons[i],
            dis: d.0,
        }));
    }
}
