//! An abstract, explicitly-seeded random source (spec §6: "Random source
//! abstraction... pass a seeded generator explicitly; never read a global").
//! Grounded on the teacher's benchmarker, which seeds `rand::rngs::StdRng`
//! via `SeedableRng::seed_from_u64` rather than touching a thread-local RNG.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces uniform `[0,1)` reals and uniform unbounded integers in `[0,
/// bound)`. Implementations must be deterministic given a fixed seed.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
    fn next_uniform_biguint(&mut self, bound: &BigUint) -> BigUint;
}

/// The default `RandomSource`, backed by `rand`'s `StdRng`.
pub struct StdRandomSource {
    rng: StdRng,
}

impl StdRandomSource {
    pub fn seeded(seed: u64) -> Self {
        StdRandomSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandomSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_uniform_biguint(&mut self, bound: &BigUint) -> BigUint {
        if bound.is_zero() {
            return BigUint::zero();
        }
        let bits = bound.bits();
        let bytes_needed = ((bits + 7) / 8) as usize;
        loop {
            let mut buf = vec![0u8; bytes_needed];
            self.rng.fill(buf.as_mut_slice());
            // `buf[0]` is the most significant byte; mask its excess high
            // bits so the candidate falls in [0, 2^bits) rather than
            // [0, 2^(8*bytes_needed)).
            let excess_bits = (bytes_needed * 8) as u64 - bits;
            if excess_bits > 0 && !buf.is_empty() {
                buf[0] &= 0xFFu8 >> excess_bits;
            }
            let candidate = BigUint::from_bytes_be(&buf);
            if &candidate < bound {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_source_is_deterministic() {
        let mut a = StdRandomSource::seeded(42);
        let mut b = StdRandomSource::seeded(42);
        let bound = BigUint::from(1_000_000u64);
        for _ in 0..20 {
            assert_eq!(a.next_uniform_biguint(&bound), b.next_uniform_biguint(&bound));
        }
    }

    #[test]
    fn uniform_biguint_stays_in_bound() {
        let mut rng = StdRandomSource::seeded(7);
        let bound = BigUint::from(17u64);
        for _ in 0..200 {
            assert!(rng.next_uniform_biguint(&bound) < bound);
        }
    }
}
