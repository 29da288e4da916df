//! Duplicate classifier sorts candidate values into new and previously seen ones.
//!
//! Classification is sequential: every value reported [`Classification::Unique`] is inserted
//! into the owned [`MembershipFilter`] before the next value is looked at, so a value
//! repeated later in the same batch is reported [`Classification::AlreadyUsed`].
//!
//! A filter can report a value as already used when it never was (false positive), but a
//! value that was inserted is never reported as unique again.

use std::fmt::{Display, Formatter};

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::MembershipFilter;
use crate::hash::{HashIndexer, WyHashIndexer};

/// Outcome of classifying one candidate value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Classification {
    /// Empty value, never inserted
    Invalid,
    /// Value the filter reports as seen before
    AlreadyUsed,
    /// Value not seen before, inserted as part of classification
    Unique,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Invalid => "invalid",
            Classification::AlreadyUsed => "already-used",
            Classification::Unique => "unique",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate value together with its classification
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedItem {
    pub item: String,
    pub classification: Classification,
}

/// Classification results aligned with the positions of the input batch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ClassificationReport {
    items: Vec<ClassifiedItem>,
}

impl ClassificationReport {
    /// Number of classified values, duplicates included
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Classified values in input order
    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedItem> {
        self.items.iter()
    }

    /// Classification of the value at input position `idx`
    pub fn get(&self, idx: usize) -> Option<Classification> {
        self.items.get(idx).map(|c| c.classification)
    }

    /// Number of values with the given classification
    pub fn count(&self, classification: Classification) -> usize {
        self.items
            .iter()
            .filter(|c| c.classification == classification)
            .count()
    }

    /// Collapse results into a mapping keyed by value.
    ///
    /// When a value occurs more than once in the batch only its last classification is kept.
    pub fn into_map(self) -> HashMap<String, Classification> {
        self.items
            .into_iter()
            .map(|c| (c.item, c.classification))
            .collect()
    }
}

impl IntoIterator for ClassificationReport {
    type Item = ClassifiedItem;
    type IntoIter = std::vec::IntoIter<ClassifiedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Request accepted by the batch classification boundary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchRequest {
    pub items: Vec<String>,
}

/// Duplicate classifier owning the membership filter it consults and updates
#[derive(Debug, PartialEq)]
pub struct DuplicateClassifier<H: HashIndexer = WyHashIndexer> {
    filter: MembershipFilter<H>,
}

impl<H: HashIndexer> DuplicateClassifier<H> {
    pub fn new(filter: MembershipFilter<H>) -> Self {
        Self { filter }
    }

    /// Insert known values without classifying them
    pub fn preload<I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for item in items {
            self.filter.add(item.as_ref());
        }
    }

    /// Classify one value, inserting it when it is unique
    #[inline]
    pub fn classify(&mut self, item: &str) -> Classification {
        if item.is_empty() {
            Classification::Invalid
        } else if self.filter.contains(item) {
            Classification::AlreadyUsed
        } else {
            self.filter.add(item);
            Classification::Unique
        }
    }

    /// Classify values in order
    pub fn classify_batch<I, T>(&mut self, items: I) -> ClassificationReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let items: Vec<ClassifiedItem> = items
            .into_iter()
            .map(|item| {
                let item = item.as_ref();
                ClassifiedItem {
                    classification: self.classify(item),
                    item: item.to_owned(),
                }
            })
            .collect();
        let report = ClassificationReport { items };
        debug!(
            items = report.len(),
            unique = report.count(Classification::Unique),
            already_used = report.count(Classification::AlreadyUsed),
            invalid = report.count(Classification::Invalid),
            "classified batch"
        );
        report
    }

    /// Classify a non-empty batch, rejecting empty ones with [`Error::EmptyBatch`]
    pub fn check_batch<T: AsRef<str>>(&mut self, items: &[T]) -> Result<ClassificationReport> {
        if items.is_empty() {
            warn!("rejected empty batch");
            return Err(Error::EmptyBatch);
        }
        Ok(self.classify_batch(items))
    }

    /// Classify the values of a [`BatchRequest`]
    pub fn handle(&mut self, request: &BatchRequest) -> Result<ClassificationReport> {
        self.check_batch(&request.items)
    }

    pub fn filter(&self) -> &MembershipFilter<H> {
        &self.filter
    }

    pub fn into_filter(self) -> MembershipFilter<H> {
        self.filter
    }
}

impl Default for DuplicateClassifier {
    fn default() -> Self {
        Self::new(MembershipFilter::default())
    }
}

/// Duplicate classifier shared between concurrent callers.
///
/// Each batch is classified under one lock acquisition, so batches from different callers
/// never interleave.
#[derive(Debug)]
pub struct SharedClassifier<H: HashIndexer = WyHashIndexer> {
    inner: Mutex<DuplicateClassifier<H>>,
}

impl<H: HashIndexer> SharedClassifier<H> {
    pub fn new(classifier: DuplicateClassifier<H>) -> Self {
        Self {
            inner: Mutex::new(classifier),
        }
    }

    /// See [`DuplicateClassifier::check_batch`]
    pub fn check_batch<T: AsRef<str>>(&self, items: &[T]) -> Result<ClassificationReport> {
        self.inner.lock().check_batch(items)
    }

    /// See [`DuplicateClassifier::handle`]
    pub fn handle(&self, request: &BatchRequest) -> Result<ClassificationReport> {
        self.inner.lock().handle(request)
    }

    /// Return whether the shared filter might contain `item`
    pub fn contains(&self, item: &str) -> bool {
        self.inner.lock().filter().contains(item)
    }

    pub fn into_inner(self) -> DuplicateClassifier<H> {
        self.inner.into_inner()
    }
}

impl Default for SharedClassifier {
    fn default() -> Self {
        Self::new(DuplicateClassifier::default())
    }
}
