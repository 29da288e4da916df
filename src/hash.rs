//! Hash index derivation shared by the membership filter and the cardinality estimator.
//!
//! Every probe is computed by re-seeding one hash function with the probe number
//! instead of drawing from `k` independent hash families. Structures only see the
//! [`HashIndexer`] trait, so a stronger scheme can be plugged in without touching them.

/// Deterministic, seedable, non-cryptographic hash over byte sequences.
///
/// Implementations must not salt their output per process: the same bytes and seed
/// have to produce the same value on every run.
pub trait HashIndexer {
    /// Hash `bytes` with the given `seed`.
    fn hash(&self, bytes: &[u8], seed: u64) -> u64;

    /// Map the hash of `bytes` under `seed` into `[0, n)`.
    ///
    /// Plain modulo reduction; the small bias for `n` not dividing `2^64` is accepted.
    #[inline]
    fn index(&self, bytes: &[u8], seed: u64, n: usize) -> usize {
        (self.hash(bytes, seed) % n as u64) as usize
    }

    /// 32-bit hash of `bytes` under seed 0, obtained by folding the 64-bit output.
    #[inline]
    fn hash32(&self, bytes: &[u8]) -> u32 {
        let h = self.hash(bytes, 0);
        ((h >> 32) ^ (h & 0xffff_ffff)) as u32
    }
}

/// Default indexer backed by [wyhash](https://github.com/wangyi-fudan/wyhash).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WyHashIndexer;

impl HashIndexer for WyHashIndexer {
    #[inline]
    fn hash(&self, bytes: &[u8], seed: u64) -> u64 {
        wyhash::wyhash(bytes, seed)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_hash_is_deterministic() {
        let indexer = WyHashIndexer;
        assert_eq!(
            indexer.hash(b"192.168.0.1", 7),
            WyHashIndexer.hash(b"192.168.0.1", 7)
        );
        assert_eq!(indexer.hash32(b"guest"), indexer.hash32(b"guest"));
    }

    #[test]
    fn test_seed_changes_output() {
        let indexer = WyHashIndexer;
        let hashes: Vec<u64> = (0..8).map(|seed| indexer.hash(b"password123", seed)).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test_case(1)]
    #[test_case(7)]
    #[test_case(1000)]
    #[test_case(1 << 20)]
    fn test_index_in_range(n: usize) {
        let indexer = WyHashIndexer;
        for i in 0..1000u32 {
            let item = format!("item{}", i);
            for seed in 0..4 {
                assert!(indexer.index(item.as_bytes(), seed, n) < n);
            }
        }
    }

    #[test]
    fn test_index_roughly_uniform() {
        let indexer = WyHashIndexer;
        let mut buckets = [0usize; 16];
        for i in 0..16_000u32 {
            buckets[indexer.index(&i.to_le_bytes(), 0, 16)] += 1;
        }
        // expected 1000 per bucket
        for count in buckets {
            assert!((800..1200).contains(&count), "bucket count {}", count);
        }
    }
}
