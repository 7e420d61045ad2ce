//! Low Discrepancy Sequences

use crate::pbrt::*;

/// Incremental Halton (radical inverse) sequence generator for a single
/// prime base. The running value is kept in double precision so long runs
/// stay well distributed.
#[derive(Clone, Debug)]
pub struct Halton {
    /// Prime base.
    base: u32,

    /// 1 / base.
    inv_base: f64,

    /// Last value returned.
    value: f64,
}

impl Halton {
    /// Create a new `Halton` generator starting at zero.
    ///
    /// * `base` - The prime base.
    pub fn new(base: u32) -> Self {
        assert!(base >= 2, "Halton base must be at least 2");
        Self {
            base,
            inv_base: 1.0 / base as f64,
            value: 0.0,
        }
    }

    /// Returns the base.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Restart the sequence at zero.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Jump to the `i`-th element of the sequence.
    ///
    /// * `i` - Sequence index.
    pub fn set_start(&mut self, mut i: u32) {
        self.value = 0.0;
        let mut factor = self.inv_base;
        while i > 0 {
            self.value += (i % self.base) as f64 * factor;
            i /= self.base;
            factor *= self.inv_base;
        }
    }

    /// Advance the sequence and return the next value in [0, 1).
    pub fn next_value(&mut self) -> Float {
        let r = 1.0 - self.value - 1e-10;
        if self.inv_base < r {
            self.value += self.inv_base;
        } else {
            let mut h = self.inv_base;
            let mut hh;
            loop {
                hh = h;
                h *= self.inv_base;
                if h < r {
                    break;
                }
            }
            self.value += hh + h - 1.0;
        }
        self.value as Float
    }
}

/// Returns the smallest prime strictly greater than `last` (for `last >= 2`).
///
/// * `last` - The previous prime.
pub fn next_prime(last: u32) -> u32 {
    let mut candidate = last + (last & 1) + 1;
    loop {
        let mut divisor = 3;
        let mut is_prime = true;
        while is_prime && divisor * divisor <= candidate {
            is_prime = candidate % divisor != 0;
            divisor += 2;
        }
        if is_prime {
            return candidate;
        }
        candidate += 2;
    }
}

/// Returns `n` Halton generators on consecutive prime bases starting at 2.
///
/// * `n` - Number of generators.
pub fn halton_generators(n: usize) -> Vec<Halton> {
    let mut base = 2;
    (0..n)
        .map(|_| {
            let h = Halton::new(base);
            base = next_prime(base);
            h
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn radical_inverse(mut i: u32, base: u32) -> f64 {
        let inv = 1.0 / base as f64;
        let mut f = inv;
        let mut r = 0.0;
        while i > 0 {
            r += (i % base) as f64 * f;
            i /= base;
            f *= inv;
        }
        r
    }

    #[test]
    fn primes_in_order() {
        let bases: Vec<u32> = halton_generators(8).iter().map(|h| h.base()).collect();
        assert_eq!(bases, vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }

    #[test]
    fn base_two_sequence() {
        let mut h = Halton::new(2);
        let values: Vec<Float> = (0..4).map(|_| h.next_value()).collect();
        assert_eq!(values, vec![0.5, 0.25, 0.75, 0.125]);
    }

    proptest! {
        #[test]
        fn incremental_matches_radical_inverse(base_idx in 0..6usize, n in 1..500u32) {
            let mut h = halton_generators(base_idx + 1).pop().unwrap();
            let base = h.base();
            let mut last = 0.0;
            for _ in 0..n {
                last = h.next_value();
            }
            prop_assert!((last as f64 - radical_inverse(n, base)).abs() < 1e-6);
        }

        #[test]
        fn set_start_skips_ahead(start in 0..200u32) {
            let mut a = Halton::new(3);
            a.set_start(start);
            let mut b = Halton::new(3);
            for _ in 0..start {
                b.next_value();
            }
            prop_assert!((a.next_value() - b.next_value()).abs() < 1e-6);
        }
    }
}
