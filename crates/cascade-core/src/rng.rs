//! Deterministic PRNG for setup-time sampling (topology, relays, seed node).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable. The tick-advance
//! logic itself never draws random numbers.

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so a scenario seed reproduces the same
/// network on every machine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform `f64` in `[0, 1)`, built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform index in `0..bound`. Returns 0 when `bound` is 0.
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        // Multiply-shift keeps the bias negligible for the small bounds used
        // during setup.
        ((self.next_u64() as u128 * bound as u128) >> 64) as usize
    }

    /// Returns `true` with the given probability. Values outside `[0, 1]`
    /// clamp to always-false / always-true.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.next_f64() < probability
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.below(items.len()))
        }
    }

    /// Two distinct indices in `0..bound`, or `None` if `bound < 2`.
    pub fn distinct_pair(&mut self, bound: usize) -> Option<(usize, usize)> {
        if bound < 2 {
            return None;
        }
        let a = self.below(bound);
        let mut b = self.below(bound - 1);
        if b >= a {
            b += 1;
        }
        Some((a, b))
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_f64_in_unit_interval() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn below_stays_in_range() {
        let mut rng = SimRng::new(3);
        for bound in 1..20 {
            for _ in 0..50 {
                assert!(rng.below(bound) < bound);
            }
        }
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn chance_clamps() {
        let mut rng = SimRng::new(999);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(!rng.chance(-1.0));
            assert!(rng.chance(1.0));
            assert!(rng.chance(2.0));
        }
    }

    #[test]
    fn chance_half_roughly_balanced() {
        let mut rng = SimRng::new(12345);
        let hits = (0..10_000).filter(|_| rng.chance(0.5)).count();
        // Expect ~5000; very generous tolerance.
        assert!((4000..=6000).contains(&hits), "expected ~5000, got {hits}");
    }

    #[test]
    fn distinct_pair_never_repeats() {
        let mut rng = SimRng::new(5);
        for _ in 0..500 {
            let (a, b) = rng.distinct_pair(3).unwrap();
            assert_ne!(a, b);
            assert!(a < 3 && b < 3);
        }
        assert!(rng.distinct_pair(1).is_none());
    }

    #[test]
    fn pick_from_slice() {
        let mut rng = SimRng::new(11);
        let taus = [0.2, 0.5, 2.0];
        for _ in 0..50 {
            assert!(taus.contains(rng.pick(&taus).unwrap()));
        }
        let empty: [f64; 0] = [];
        assert!(rng.pick(&empty).is_none());
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }

        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);
        for _ in 0..10 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
