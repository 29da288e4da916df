//! `distinct-sketch` answers two approximate questions about large or streaming collections
//! without storing every element:
//! - "has this value been seen before?" with a Bloom-style [`MembershipFilter`]
//!   (no false negatives, bounded false-positive rate);
//! - "how many distinct values have been seen?" with a HyperLogLog [`CardinalityEstimator`]
//!   (relative error about `1.04 / sqrt(2^p)`).
//!
//! [`DuplicateClassifier`] builds on the filter to sort batches of candidate values into
//! unique and already used ones, and [`report::compare`] measures the estimator against
//! exact counting.
mod beta;
pub mod classifier;
pub mod counter;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod hash;
pub mod ingest;
pub mod report;

pub use classifier::{
    BatchRequest, Classification, ClassificationReport, ClassifiedItem, DuplicateClassifier,
    SharedClassifier,
};
pub use counter::{count_unique_exact, DistinctCount, DistinctCounter, ExactCounter};
pub use error::{Error, Result};
pub use estimator::CardinalityEstimator;
pub use filter::{FilterParams, MembershipFilter};
pub use hash::{HashIndexer, WyHashIndexer};
