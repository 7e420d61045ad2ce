//! Random Number Generator.

use crate::pbrt::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// 32-bit precision value for 1 - epsilon.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1"); // 0.99999994

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// Source of distinct sequence indices for generators that are created on
/// worker threads.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// PCG32 pseudo-random number generator.
#[derive(Clone, Debug)]
pub struct RNG {
    state: u64,
    inc: u64,
}

impl Default for RNG {
    /// Return a new instance of `RNG` with default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl RNG {
    /// Create a new `RNG` seeded with the given sequence.
    ///
    /// * `sequence_index` - The starting sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut rng = Self { state: 0, inc: (sequence_index << 1) | 1 };
        rng.uniform_u32();
        rng.state = rng.state.wrapping_add(PCG32_DEFAULT_STATE);
        rng.uniform_u32();
        rng
    }

    /// Create a new `RNG` on a sequence not used by any other generator
    /// created this way.
    pub fn unique() -> Self {
        Self::new(NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns a uniformly distributed u32 value.
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    pub fn uniform_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32") as Float,
            ONE_MINUS_EPSILON,
        )
    }
}
