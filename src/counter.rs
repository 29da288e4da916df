use std::hash::Hash;
use std::mem::size_of;

use enum_dispatch::enum_dispatch;
use hashbrown::HashSet;

use crate::estimator::CardinalityEstimator;

/// Distinct counters supported by the comparison report
#[derive(Debug)]
#[enum_dispatch]
pub enum DistinctCounter {
    Exact(ExactCounter),
    Approximate(CardinalityEstimator),
}

/// Trait implemented by every distinct counter.
#[enum_dispatch(DistinctCounter)]
pub trait DistinctCount {
    fn insert(&mut self, item: &[u8]);
    fn count(&self) -> f64;
    fn size_of(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Exact distinct counter keeping every item it has seen
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExactCounter {
    items: HashSet<Box<[u8]>>,
}

impl ExactCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DistinctCount for ExactCounter {
    #[inline]
    fn insert(&mut self, item: &[u8]) {
        if !item.is_empty() && !self.items.contains(item) {
            self.items.insert(item.into());
        }
    }

    fn count(&self) -> f64 {
        self.items.len() as f64
    }

    fn size_of(&self) -> usize {
        size_of::<Self>()
            + self.items.capacity() * size_of::<Box<[u8]>>()
            + self.items.iter().map(|item| item.len()).sum::<usize>()
    }

    fn name(&self) -> &'static str {
        "exact (set)"
    }
}

impl DistinctCount for CardinalityEstimator {
    #[inline]
    fn insert(&mut self, item: &[u8]) {
        self.add(item);
    }

    fn count(&self) -> f64 {
        self.estimate()
    }

    fn size_of(&self) -> usize {
        CardinalityEstimator::size_of(self)
    }

    fn name(&self) -> &'static str {
        "HyperLogLog"
    }
}

/// Count distinct non-empty items exactly.
///
/// Empty items are not counted, so the result matches [`CardinalityEstimator`] and
/// [`ExactCounter`], which both ignore them. A plain set over the same input would count an
/// empty item once. Addresses from [`crate::ingest`] are never empty.
pub fn count_unique_exact<I, T>(items: I) -> usize
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]> + Hash + Eq,
{
    items
        .into_iter()
        .filter(|item| !item.as_ref().is_empty())
        .collect::<HashSet<T>>()
        .len()
}
