//! AtomicFloat

use crate::pbrt::{bits_to_float, float_to_bits, Float};
use std::sync::atomic::{AtomicU32, Ordering};

/// Atomic floating point value stored as its bit pattern in an `AtomicU32`.
#[derive(Debug, Default)]
pub struct AtomicFloat {
    /// Bit representation of floating point value.
    bits: AtomicU32,
}

impl AtomicFloat {
    /// Create a new `AtomicFloat`.
    ///
    /// * `v` - The value.
    pub fn new(v: Float) -> Self {
        Self {
            bits: AtomicU32::new(float_to_bits(v)),
        }
    }

    /// Apply `f` atomically and return the new value.
    ///
    /// * `f` - Update function.
    fn update<F: Fn(Float) -> Float>(&self, f: F) -> Float {
        let mut old_bits = self.bits.load(Ordering::Relaxed);
        loop {
            let new_value = f(bits_to_float(old_bits));
            match self.bits.compare_exchange_weak(
                old_bits,
                float_to_bits(new_value),
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return new_value,
                Err(x) => old_bits = x,
            }
        }
    }

    /// Add a floating point value and return the result.
    ///
    /// * `v` - The value to add.
    pub fn add(&self, v: Float) -> Float {
        self.update(|x| x + v)
    }

    /// Multiply by a floating point value and return the result.
    ///
    /// * `v` - The factor.
    pub fn mul(&self, v: Float) -> Float {
        self.update(|x| x * v)
    }

    /// Loads the floating point value.
    pub fn load(&self) -> Float {
        bits_to_float(self.bits.load(Ordering::SeqCst))
    }

    /// Stores the floating point value.
    ///
    /// * `v` - The value.
    pub fn store(&self, v: Float) {
        self.bits.store(float_to_bits(v), Ordering::SeqCst);
    }
}

impl Clone for AtomicFloat {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn mul_doubles() {
        let f = AtomicFloat::new(1.0);
        assert_eq!(f.mul(2.0), 2.0);
        assert_eq!(f.mul(2.0), 4.0);
        f.store(1.0);
        assert_eq!(f.load(), 1.0);
    }

    #[test]
    fn concurrent_adds() {
        let f = Arc::new(AtomicFloat::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let f = Arc::clone(&f);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        f.add(1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(f.load(), 4000.0);
    }
}
