//! Deterministic PRNG wrapper.
//!
//! Pinned to `ChaCha8Rng` seeded via `seed_from_u64`. `uniform_real`/`randrange` are
//! the two sampling primitives every draw in the scenario generator and GA optimizer
//! goes through, so the draw order is reproducible end to end for a fixed seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct SimRng {
    rng: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform real in `[lo, hi)`.
    pub fn uniform_real(&mut self, lo: f64, hi: f64) -> f64 {
        if (hi - lo).abs() < f64::EPSILON {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform integer in `[0, n)`.
    pub fn randrange(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Uniform integer in `[lo, hi]` inclusive (used for priority/deadline jitter draws).
    pub fn randint_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo..=hi)
    }

    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..50 {
            assert_eq!(a.randrange(10), b.randrange(10));
            assert!((a.uniform_real(0.0, 100.0) - b.uniform_real(0.0, 100.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let seq_a: Vec<usize> = (0..20).map(|_| a.randrange(1000)).collect();
        let seq_b: Vec<usize> = (0..20).map(|_| b.randrange(1000)).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_uniform_real_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.uniform_real(5.0, 10.0);
            assert!(v >= 5.0 && v < 10.0);
        }
    }
}
