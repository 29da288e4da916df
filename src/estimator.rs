//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset and is defined with precision parameter `p`,
//! which defines number of hash bits used for HyperLogLog register indices.
//!
//! # Data-structure design
//!
//! - `2^p` registers stored one byte each, all starting at 0.
//! - Each item is hashed once into 32 bits. The top `p` bits select a register, and the
//!   register keeps the maximum rank observed for it, where rank is the number of leading
//!   zeros in the remaining `32 - p` bits plus one (`32 - p + 1` when they are all zero).
//! - Registers only ever grow, so repeated inserts of the same item change nothing.
//!
//! # Estimate
//!
//! [Original HyperLogLog paper](https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)
//!
//! - Raw estimate: `E = alpha(m) * m^2 / sum(2^-register)`.
//! - Small range: when `E <= 2.5 * m` and some registers are still zero, linear counting
//!   `m * ln(m / zeros)` is used instead.
//! - Large range: when `E > 2^32 / 30`, hash collisions in 32 bits are corrected for with
//!   `-2^32 * ln(1 - E / 2^32)`.
//!
//! Expected relative error is `1.04 / sqrt(2^p)`:
//!   p = 10: 3.25%
//!   p = 12: 1.62%
//!   p = 14: 0.81%
//!   p = 18: 0.20%
//!
//! Precision is expected in `[4..18]` but is not validated. Smaller values give poor
//! accuracy and values of 32 or more leave no bits for the rank.

use std::fmt::{Debug, Formatter};
use std::mem::{size_of, size_of_val};

use tracing::debug;

use crate::beta::{beta_horner, MAX_PRECISION, MIN_PRECISION};
use crate::error::{Error, Result};
use crate::hash::{HashIndexer, WyHashIndexer};

/// Default precision
pub const DEFAULT_PRECISION: u8 = 14;

/// `2^32`, the size of the hash space
const HASH_SPACE: f64 = 4_294_967_296.0;

pub struct CardinalityEstimator<H: HashIndexer = WyHashIndexer> {
    /// Number of hash bits used for register indices
    precision: u8,
    /// Register ranks
    registers: Vec<u8>,
    indexer: H,
}

impl CardinalityEstimator {
    /// Creates new instance of `CardinalityEstimator` with `2^precision` registers
    pub fn new(precision: u8) -> Self {
        Self::with_indexer(precision, WyHashIndexer)
    }
}

impl<H: HashIndexer> CardinalityEstimator<H> {
    /// Creates new instance of `CardinalityEstimator` using custom hash `indexer`
    pub fn with_indexer(precision: u8, indexer: H) -> Self {
        Self {
            precision,
            registers: vec![0; 1 << precision],
            indexer,
        }
    }

    /// Insert an item into `CardinalityEstimator`, ignoring empty items
    #[inline]
    pub fn add<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) {
        let bytes = item.as_ref();
        if bytes.is_empty() {
            return;
        }
        let h = self.indexer.hash32(bytes);
        self.add_hash(h);
    }

    /// Insert 32-bit hash into `CardinalityEstimator`
    #[inline]
    pub fn add_hash(&mut self, h: u32) {
        let (idx, rank) = self.decode_hash(h);
        let register = &mut self.registers[idx];
        if rank > *register {
            *register = rank;
        }
    }

    /// Return register index and rank of hash
    #[inline]
    fn decode_hash(&self, h: u32) -> (usize, u8) {
        let p = u32::from(self.precision);
        let idx = (u64::from(h) >> (32 - p)) as usize;
        let rest = (u64::from(h) << p) as u32;
        let rank = rest.leading_zeros().min(32 - p) + 1;
        (idx, rank as u8)
    }

    /// Return harmonic sum of registers and number of zero registers
    #[inline]
    fn harmonic_sum_and_zeros(&self) -> (f64, usize) {
        self.registers
            .iter()
            .fold((0.0, 0), |(sum, zeros), &r| {
                (sum + 1.0 / (1u64 << r) as f64, zeros + usize::from(r == 0))
            })
    }

    /// Return cardinality estimate
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let (sum, zeros) = self.harmonic_sum_and_zeros();
        let raw = alpha(self.registers.len()) * m * m / sum;

        if raw <= 2.5 * m {
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
            return raw;
        }
        if raw <= HASH_SPACE / 30.0 {
            return raw;
        }
        // saturated sketches push `raw` past the hash space
        let remaining = (1.0 - raw / HASH_SPACE).max(f64::MIN_POSITIVE);
        -HASH_SPACE * remaining.ln()
    }

    /// Return cardinality estimate using LogLog-Beta bias correction.
    ///
    /// Falls back to [`estimate`](Self::estimate) for precisions without fitted coefficients.
    pub fn estimate_loglog_beta(&self) -> f64 {
        let p = usize::from(self.precision);
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&p) {
            return self.estimate();
        }
        let m = self.registers.len();
        let (sum, zeros) = self.harmonic_sum_and_zeros();
        alpha(m) * ((m * (m - zeros)) as f64) / (sum + beta_horner(zeros as f64, p))
    }

    /// Merge cardinality estimators by taking the maximum of each register pair
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        if self.precision != rhs.precision {
            return Err(Error::IncompatibleMerge {
                expected: format!("precision={}", self.precision),
                found: format!("precision={}", rhs.precision),
            });
        }
        for (lhs, &rhs) in self.registers.iter_mut().zip(&rhs.registers) {
            *lhs = (*lhs).max(rhs);
        }
        debug!(precision = self.precision, "merged cardinality estimators");
        Ok(())
    }

    /// Precision parameter `p`
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Number of registers (`2^p`)
    #[inline]
    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Rank stored in register `idx`
    #[inline]
    pub fn register(&self, idx: usize) -> u8 {
        self.registers[idx]
    }

    /// Expected relative standard error, `1.04 / sqrt(m)`
    pub fn relative_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    /// Return memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }
}

impl Default for CardinalityEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl<H: HashIndexer + Clone> Clone for CardinalityEstimator<H> {
    fn clone(&self) -> Self {
        Self {
            precision: self.precision,
            registers: self.registers.clone(),
            indexer: self.indexer.clone(),
        }
    }
}

impl<H: HashIndexer> PartialEq for CardinalityEstimator<H> {
    /// Compare cardinality estimators
    fn eq(&self, rhs: &Self) -> bool {
        self.precision == rhs.precision && self.registers == rhs.registers
    }
}

impl<H: HashIndexer> Debug for CardinalityEstimator<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {}, size: {} }}",
            self.precision,
            self.estimate().round(),
            self.size_of()
        )
    }
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
