//! Membership filter allows to test whether an item has been seen before
//! and is defined by two parameters:
//! - `m`: number of bits in the filter.
//! - `k`: number of hash probes per item.
//!
//! # Guarantees
//! - No false negatives: after `add(x)`, `contains(x)` always returns `true`.
//! - False positives are possible. For `n` distinct items inserted the probability is
//!   approximately `(1 - e^(-kn/m))^k`.
//! - Bits are never cleared, so the filter state only grows.
//!
//! Probe `i` of an item is `hash(item, seed = i) % m`. Empty items are ignored by `add`
//! and never contained.
//!
//! `m` and `k` are not validated: `m == 0` panics on the first probe and `k == 0`
//! makes every non-empty item look present.

use std::f64::consts::LN_2;
use std::fmt::{Debug, Formatter};
use std::mem::{size_of, size_of_val};

use bitvec::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash::{HashIndexer, WyHashIndexer};

/// Default number of bits
pub const DEFAULT_NUM_BITS: usize = 1000;
/// Default number of hash probes
pub const DEFAULT_NUM_HASHES: usize = 3;
/// Smallest target false-positive rate accepted when sizing a filter
pub const MIN_FALSE_POSITIVE_RATE: f64 = 1e-9;

pub struct MembershipFilter<H: HashIndexer = WyHashIndexer> {
    /// Packed bit array of length `m`
    bits: BitVec<u64, Lsb0>,
    /// Number of hash probes per item
    k: usize,
    indexer: H,
}

impl MembershipFilter {
    /// Creates new filter of `m` bits probed `k` times per item
    pub fn new(m: usize, k: usize) -> Self {
        Self::with_indexer(m, k, WyHashIndexer)
    }

    /// Creates new filter sized for `expected_items` at `target_fpr` false-positive rate.
    ///
    /// `target_fpr` is meant to lie in `(0, 1)`, see [`FilterParams::optimal`] for how other
    /// values are handled.
    pub fn with_false_positive_rate(expected_items: usize, target_fpr: f64) -> Self {
        let params = FilterParams::optimal(expected_items, target_fpr);
        Self::new(params.num_bits, params.num_hashes)
    }
}

impl<H: HashIndexer> MembershipFilter<H> {
    /// Creates new filter using custom hash `indexer`
    pub fn with_indexer(m: usize, k: usize, indexer: H) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 0; m],
            k,
            indexer,
        }
    }

    /// Insert an item into the filter
    #[inline]
    pub fn add<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) {
        let bytes = item.as_ref();
        if bytes.is_empty() {
            return;
        }
        let m = self.bits.len();
        for seed in 0..self.k as u64 {
            let idx = self.indexer.index(bytes, seed, m);
            self.bits.set(idx, true);
        }
    }

    /// Return whether an item might have been inserted
    #[inline]
    pub fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> bool {
        let bytes = item.as_ref();
        if bytes.is_empty() {
            return false;
        }
        let m = self.bits.len();
        (0..self.k as u64).all(|seed| self.bits[self.indexer.index(bytes, seed, m)])
    }

    /// Merge `rhs` into `self` with bitwise OR.
    ///
    /// Both filters must have been created with the same `m` and `k`, and must use the
    /// same indexer for the result to be meaningful.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        if self.bits.len() != rhs.bits.len() || self.k != rhs.k {
            return Err(Error::IncompatibleMerge {
                expected: format!("m={}, k={}", self.bits.len(), self.k),
                found: format!("m={}, k={}", rhs.bits.len(), rhs.k),
            });
        }
        for (lhs, rhs) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(rhs.bits.as_raw_slice())
        {
            *lhs |= *rhs;
        }
        debug!(bits_set = self.len(), "merged membership filters");
        Ok(())
    }

    /// Number of bits in the filter (`m`)
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// Number of hash probes per item (`k`)
    #[inline]
    pub fn num_hashes(&self) -> usize {
        self.k
    }

    /// Number of bits currently set
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Return whether no bit is set
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Fraction of bits currently set
    pub fn fill_ratio(&self) -> f64 {
        if self.bits.is_empty() {
            return 0.0;
        }
        self.len() as f64 / self.bits.len() as f64
    }

    /// Theoretical false-positive rate after `n` distinct insertions
    pub fn false_positive_rate(&self, n: usize) -> f64 {
        false_positive_rate(self.bits.len(), self.k, n)
    }

    /// False-positive rate implied by the current fill ratio
    pub fn estimated_false_positive_rate(&self) -> f64 {
        self.fill_ratio().powi(self.k as i32)
    }

    /// Return memory size of `MembershipFilter`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.bits.as_raw_slice())
    }

    /// Read-only view of the bit array
    pub fn bits(&self) -> &BitSlice<u64, Lsb0> {
        self.bits.as_bitslice()
    }
}

impl Default for MembershipFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_BITS, DEFAULT_NUM_HASHES)
    }
}

impl<H: HashIndexer + Clone> Clone for MembershipFilter<H> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            k: self.k,
            indexer: self.indexer.clone(),
        }
    }
}

impl<H: HashIndexer> PartialEq for MembershipFilter<H> {
    /// Compare filter parameters and bit arrays
    fn eq(&self, rhs: &Self) -> bool {
        self.k == rhs.k && self.bits == rhs.bits
    }
}

impl<H: HashIndexer> Debug for MembershipFilter<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ m: {}, k: {}, bits_set: {}, size: {} }}",
            self.num_bits(),
            self.k,
            self.len(),
            self.size_of()
        )
    }
}

/// Filter dimensions derived from an expected load and accuracy target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub num_bits: usize,
    pub num_hashes: usize,
    /// False-positive rate these dimensions give at the expected load
    pub expected_fpr: f64,
}

impl FilterParams {
    /// Compute `m = -n * ln(fpr) / ln(2)^2` and `k = (m / n) * ln(2)`, with `k` clamped to `[1, 32]`.
    ///
    /// Rates below [`MIN_FALSE_POSITIVE_RATE`], including zero, negative and NaN rates, are
    /// raised to it. Rates of 1 or more give a single bit.
    pub fn optimal(expected_items: usize, target_fpr: f64) -> Self {
        if expected_items == 0 {
            return Self {
                num_bits: 1,
                num_hashes: 1,
                expected_fpr: 0.0,
            };
        }
        let target_fpr = if target_fpr >= MIN_FALSE_POSITIVE_RATE {
            target_fpr
        } else {
            MIN_FALSE_POSITIVE_RATE
        };
        let n = expected_items as f64;
        let num_bits = ((-n * target_fpr.ln() / (LN_2 * LN_2)).ceil() as usize).max(1);
        let num_hashes = (((num_bits as f64 / n) * LN_2).round() as usize).clamp(1, 32);
        Self {
            num_bits,
            num_hashes,
            expected_fpr: false_positive_rate(num_bits, num_hashes, expected_items),
        }
    }
}

/// `(1 - e^(-kn/m))^k`
pub fn false_positive_rate(m: usize, k: usize, n: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    #[test]
    fn test_add_contains() {
        let mut f = MembershipFilter::new(1000, 3);
        assert!(!f.contains("password123"));
        f.add("password123");
        assert!(f.contains("password123"));
        assert!(f.len() > 0 && f.len() <= 3);
    }

    #[test]
    fn test_empty_item_ignored() {
        let mut f = MembershipFilter::default();
        f.add("");
        assert!(f.is_empty());
        assert!(!f.contains(""));
        f.add("x");
        assert!(!f.contains(""));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut once = MembershipFilter::new(256, 4);
        once.add("admin123");
        let mut twice = MembershipFilter::new(256, 4);
        twice.add("admin123");
        twice.add("admin123");
        assert_eq!(once, twice);
    }

    #[test_case(1000, 3, 100)]
    #[test_case(10_000, 7, 1000)]
    #[test_case(64, 1, 10)]
    fn test_no_false_negatives(m: usize, k: usize, n: usize) {
        let mut f = MembershipFilter::new(m, k);
        let items: Vec<String> = (0..n).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
        for item in &items {
            f.add(item);
        }
        assert!(items.iter().all(|item| f.contains(item)));
    }

    #[test_case(10_000, 7, 1000)]
    #[test_case(1000, 3, 100)]
    #[test_case(4096, 2, 1000)]
    fn test_false_positive_rate_bounded(m: usize, k: usize, n: usize) {
        let mut rng = StdRng::seed_from_u64(12345);
        let mut f = MembershipFilter::new(m, k);
        for _ in 0..n {
            f.add(&rng.gen::<u64>().to_le_bytes());
        }
        let trials = 100_000;
        // inserted keys are 8 bytes, probes are 9 bytes and can never collide with them
        let false_positives = (0..trials)
            .filter(|_| {
                let mut probe = [1u8; 9];
                probe[..8].copy_from_slice(&rng.gen::<u64>().to_le_bytes());
                f.contains(&probe)
            })
            .count();
        let observed = false_positives as f64 / trials as f64;
        let bound = f.false_positive_rate(n);
        assert!(
            observed <= bound * 1.25 + 0.002,
            "observed {} vs theoretical {}",
            observed,
            bound
        );
    }

    #[test]
    fn test_merge() {
        let mut lhs = MembershipFilter::new(2048, 4);
        let mut rhs = MembershipFilter::new(2048, 4);
        lhs.add("alpha");
        rhs.add("beta");
        lhs.merge(&rhs).unwrap();
        assert!(lhs.contains("alpha"));
        assert!(lhs.contains("beta"));
    }

    #[test_case(2048, 3 ; "different k")]
    #[test_case(1024, 4 ; "different m")]
    fn test_merge_incompatible(m: usize, k: usize) {
        let mut lhs = MembershipFilter::new(2048, 4);
        let rhs = MembershipFilter::new(m, k);
        assert!(matches!(
            lhs.merge(&rhs),
            Err(Error::IncompatibleMerge { .. })
        ));
    }

    #[test_case(100, 0.01 => (959, 7))]
    #[test_case(1000, 0.05 => (6236, 4))]
    #[test_case(0, 0.01 => (1, 1))]
    fn test_optimal_params(n: usize, fpr: f64) -> (usize, usize) {
        let params = FilterParams::optimal(n, fpr);
        if n > 0 {
            assert!(params.expected_fpr <= fpr * 1.05);
        }
        (params.num_bits, params.num_hashes)
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-0.5 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(1e-300 ; "below minimum")]
    fn test_optimal_params_degenerate_rate(fpr: f64) {
        let params = FilterParams::optimal(1000, fpr);
        assert_eq!(params, FilterParams::optimal(1000, MIN_FALSE_POSITIVE_RATE));
        assert!(params.num_bits < 100_000);

        let filter = MembershipFilter::with_false_positive_rate(1000, fpr);
        assert_eq!(filter.num_bits(), params.num_bits);
    }

    #[test]
    fn test_optimal_params_rate_above_one() {
        let params = FilterParams::optimal(1000, 2.0);
        assert_eq!((params.num_bits, params.num_hashes), (1, 1));
    }

    #[test]
    fn test_fill_ratio_and_estimated_rate() {
        let mut f = MembershipFilter::new(100, 2);
        assert_eq!(f.fill_ratio(), 0.0);
        assert_eq!(f.estimated_false_positive_rate(), 0.0);
        for i in 0..1000u32 {
            f.add(&i.to_le_bytes());
        }
        assert_eq!(f.fill_ratio(), 1.0);
        assert_eq!(f.estimated_false_positive_rate(), 1.0);
        assert!(f.contains("never inserted"));
    }

    #[test]
    fn test_debug() {
        let f = MembershipFilter::new(128, 3);
        assert_eq!(format!("{:?}", f), format!("{{ m: 128, k: 3, bits_set: 0, size: {} }}", f.size_of()));
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(items in proptest::collection::vec(".{1,24}", 1..64)) {
            let mut f = MembershipFilter::new(512, 3);
            for item in &items {
                f.add(item);
                prop_assert!(f.contains(item));
            }
            for item in &items {
                prop_assert!(f.contains(item));
            }
        }

        #[test]
        fn prop_bits_never_cleared(items in proptest::collection::vec(".{0,16}", 1..64)) {
            let mut f = MembershipFilter::new(300, 4);
            for item in &items {
                let before = f.bits().to_bitvec();
                f.add(item);
                let after = f.bits();
                prop_assert!(before.iter_ones().all(|i| after[i]));
            }
        }
    }
}
