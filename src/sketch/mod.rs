//! HyperLogLog cardinality sketch.
//!
//! Fixed `2^p` register array with the classic piecewise estimator:
//! - register update by max over leading-zero ranks
//! - commutative, associative, idempotent merge (elementwise max)
//! - linear-counting and large-range corrections at the estimate branches

pub mod hasher;

pub use hasher::hash64;

/// One HLL register array of length `2^precision`.
///
/// Mutated in place by [`Sketch::insert`]; [`Sketch::merge`] is
/// non-destructive and produces a new sketch. Registers only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sketch {
    precision: u8,
    registers: Vec<u8>,
}

impl Sketch {
    /// Empty sketch with `2^precision` zero registers.
    pub fn new(precision: u8) -> Self {
        debug_assert!((4..=18).contains(&precision));
        Self {
            precision,
            registers: vec![0; 1usize << precision],
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Rebuild a sketch from stored parts.
    ///
    /// Returns `None` when the register count does not equal `2^precision`
    /// or any register exceeds the maximum rank `64 - p + 1`; callers treat
    /// that as a malformed record.
    pub fn from_parts(precision: u8, registers: Vec<u8>) -> Option<Self> {
        if !(4..=18).contains(&precision) {
            return None;
        }
        if registers.len() != 1usize << precision {
            return None;
        }
        let max_rank = 64 - precision + 1;
        if registers.iter().any(|&r| r > max_rank) {
            return None;
        }
        Some(Self {
            precision,
            registers,
        })
    }

    /// Record one element.
    #[inline]
    pub fn insert(&mut self, element: &str) {
        self.insert_hash(hash64(element));
    }

    /// Record one pre-computed 64-bit hash.
    ///
    /// The top `p` bits select a register; the rank of the leftmost set bit
    /// in the remaining `64 - p` bits is max-folded into it.
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let p = self.precision as u32;
        let idx = (hash >> (64 - p)) as usize;
        let w = hash << p;
        let rho = if w == 0 {
            (64 - p + 1) as u8
        } else {
            (w.leading_zeros() + 1) as u8
        };
        if rho > self.registers[idx] {
            self.registers[idx] = rho;
        }
    }

    /// Union with another sketch of the same precision, as a new sketch.
    ///
    /// Commutative, associative, and idempotent; the empty sketch is the
    /// identity element.
    pub fn merge(&self, other: &Sketch) -> Sketch {
        debug_assert_eq!(self.precision, other.precision);
        let registers = self
            .registers
            .iter()
            .zip(&other.registers)
            .map(|(a, b)| (*a).max(*b))
            .collect();
        Sketch {
            precision: self.precision,
            registers,
        }
    }

    /// `true` when no element has ever been recorded.
    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    /// Approximate number of distinct elements recorded.
    ///
    /// Raw harmonic-mean estimate with linear counting below `2.5 * m` and
    /// the large-range correction above `2^32 / 30`. Always non-negative;
    /// callers round if they need an integer.
    pub fn estimate(&self) -> f64 {
        const TWO_POW_32: f64 = 4_294_967_296.0;

        let m = self.registers.len() as f64;
        let z: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-(r as i32)))
            .sum();
        let raw = alpha(self.registers.len()) * m * m / z;

        if raw <= 2.5 * m {
            let zeros = self.registers.iter().filter(|&&r| r == 0).count();
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
            return raw;
        }
        if raw <= TWO_POW_32 / 30.0 {
            raw
        } else {
            -TWO_POW_32 * (1.0 - raw / TWO_POW_32).ln()
        }
    }
}

/// Bias-correction constant for `m` registers.
fn alpha(m: usize) -> f64 {
    match m {
        0..=15 => 1.0,
        16..=31 => 0.673,
        32..=63 => 0.697,
        64..=127 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sketch_of(ids: impl IntoIterator<Item = String>) -> Sketch {
        let mut sketch = Sketch::new(10);
        for id in ids {
            sketch.insert(&id);
        }
        sketch
    }

    #[test]
    fn test_empty_estimates_zero() {
        let sketch = Sketch::new(10);
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0.0);
    }

    #[test]
    fn test_duplicate_insensitive() {
        let mut sketch = Sketch::new(10);
        sketch.insert("alice");
        let once = sketch.clone();
        for _ in 0..1000 {
            sketch.insert("alice");
        }
        assert_eq!(sketch, once);
        assert_eq!(sketch.estimate(), once.estimate());
    }

    #[test]
    fn test_small_count_near_exact() {
        // 64 distinct ids at m=1024 sit deep in the linear-counting branch.
        let sketch = sketch_of((0..64).map(|i| format!("visitor-{}", i)));
        let estimate = sketch.estimate();
        assert!(
            (45.0..=85.0).contains(&estimate),
            "estimate {} outside [45, 85]",
            estimate
        );
    }

    #[test]
    fn test_accuracy_at_ten_thousand() {
        // Theoretical relative error at m=1024 is 1.04/sqrt(1024) ~ 3.25%;
        // assert a generous 3x envelope.
        let sketch = sketch_of((0..10_000).map(|i| format!("visitor-{}", i)));
        let estimate = sketch.estimate();
        assert!(
            (9_000.0..=11_000.0).contains(&estimate),
            "estimate {} outside [9000, 11000]",
            estimate
        );
    }

    #[test]
    fn test_monotone_under_growth() {
        let mut sketch = Sketch::new(10);
        let mut previous = 0.0;
        for block in 0..5 {
            for i in (block * 2000)..((block + 1) * 2000) {
                sketch.insert(&format!("visitor-{}", i));
            }
            let estimate = sketch.estimate();
            assert!(
                estimate > previous,
                "estimate {} did not grow past {}",
                estimate,
                previous
            );
            previous = estimate;
        }
    }

    #[test]
    fn test_merge_algebra() {
        let a = sketch_of((0..500).map(|i| format!("a-{}", i)));
        let b = sketch_of((0..500).map(|i| format!("b-{}", i)));
        let c = sketch_of((0..500).map(|i| format!("c-{}", i)));

        // Associative and commutative.
        assert_eq!(a.merge(&b.merge(&c)), a.merge(&b).merge(&c));
        assert_eq!(a.merge(&b), b.merge(&a));

        // Idempotent, with the empty sketch as identity.
        assert_eq!(a.merge(&a), a);
        assert_eq!(Sketch::new(10).merge(&a), a);
    }

    #[test]
    fn test_merge_union_estimate() {
        // Disjoint halves merged should estimate close to the full set.
        let a = sketch_of((0..5_000).map(|i| format!("visitor-{}", i)));
        let b = sketch_of((5_000..10_000).map(|i| format!("visitor-{}", i)));
        let merged = a.merge(&b);
        let estimate = merged.estimate();
        assert!(
            (9_000.0..=11_000.0).contains(&estimate),
            "merged estimate {} outside [9000, 11000]",
            estimate
        );
    }

    #[test]
    fn test_from_parts_shape_checks() {
        assert!(Sketch::from_parts(10, vec![0; 1024]).is_some());
        assert!(Sketch::from_parts(10, vec![0; 512]).is_none());
        assert!(Sketch::from_parts(10, vec![0; 1025]).is_none());
        assert!(Sketch::from_parts(3, vec![0; 8]).is_none());

        // Register above the maximum rank for p=10 is corrupt.
        let mut registers = vec![0u8; 1024];
        registers[7] = 56;
        assert!(Sketch::from_parts(10, registers).is_none());
    }

    #[test]
    fn test_rank_bounds() {
        let mut sketch = Sketch::new(10);
        // All-zero suffix yields the maximum rank 64 - p + 1.
        sketch.insert_hash(0);
        assert_eq!(sketch.registers()[0], 55);

        // Suffix with its lowest bit set yields rank 64 - p.
        let mut sketch = Sketch::new(10);
        sketch.insert_hash(1);
        assert_eq!(sketch.registers()[0], 54);
    }

    proptest! {
        #[test]
        fn prop_update_order_independent(
            hashes in prop::collection::vec(any::<u64>(), 0..256),
            seed in any::<u64>(),
        ) {
            let mut in_order = Sketch::new(10);
            for h in &hashes {
                in_order.insert_hash(*h);
            }

            let mut shuffled = hashes.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
            let mut permuted = Sketch::new(10);
            for h in &shuffled {
                permuted.insert_hash(*h);
            }

            prop_assert_eq!(in_order.registers(), permuted.registers());
        }

        #[test]
        fn prop_merge_never_decreases_registers(
            left in prop::collection::vec(any::<u64>(), 0..128),
            right in prop::collection::vec(any::<u64>(), 0..128),
        ) {
            let mut a = Sketch::new(10);
            for h in &left {
                a.insert_hash(*h);
            }
            let mut b = Sketch::new(10);
            for h in &right {
                b.insert_hash(*h);
            }
            let merged = a.merge(&b);
            for (i, r) in merged.registers().iter().enumerate() {
                prop_assert!(*r >= a.registers()[i]);
                prop_assert!(*r >= b.registers()[i]);
            }
        }
    }
}
