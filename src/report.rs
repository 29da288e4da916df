//! Side-by-side comparison of exact and approximate distinct counting.

use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use tracing::info;

use crate::counter::{DistinctCount, DistinctCounter, ExactCounter};
use crate::estimator::CardinalityEstimator;

/// One counting method and what it produced
#[derive(Clone, Debug, PartialEq, Tabled)]
pub struct ComparisonRecord {
    #[tabled(rename = "method")]
    pub method: &'static str,
    #[tabled(rename = "distinct items")]
    pub distinct: u64,
    #[tabled(rename = "elapsed (s)", display_with = "format_seconds")]
    pub elapsed: Duration,
    #[tabled(rename = "memory (bytes)")]
    pub size: usize,
}

fn format_seconds(elapsed: &Duration) -> String {
    format!("{:.4}", elapsed.as_secs_f64())
}

/// Exact and approximate counts over the same items
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    /// Number of items processed, duplicates included
    pub total_items: usize,
    pub exact: ComparisonRecord,
    pub approximate: ComparisonRecord,
}

impl Comparison {
    /// Relative deviation of the approximate count from the exact one
    pub fn relative_error(&self) -> f64 {
        if self.exact.distinct == 0 {
            return 0.0;
        }
        (self.approximate.distinct as f64 - self.exact.distinct as f64).abs()
            / self.exact.distinct as f64
    }
}

impl Display for Comparison {
    /// Render both records as a markdown table
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let table_config = Settings::default().with(Style::markdown());
        let table = Table::new([&self.exact, &self.approximate])
            .with(table_config)
            .to_string();
        f.write_str(&table)
    }
}

/// Count distinct `items` exactly and with a `2^precision` register estimator, timing both
pub fn compare<T: AsRef<[u8]>>(items: &[T], precision: u8) -> Comparison {
    let exact = measure(DistinctCounter::from(ExactCounter::new()), items);
    let approximate = measure(
        DistinctCounter::from(CardinalityEstimator::new(precision)),
        items,
    );
    let comparison = Comparison {
        total_items: items.len(),
        exact,
        approximate,
    };
    info!(
        total_items = comparison.total_items,
        exact = comparison.exact.distinct,
        approximate = comparison.approximate.distinct,
        relative_error = comparison.relative_error(),
        "compared distinct counts"
    );
    comparison
}

fn measure<T: AsRef<[u8]>>(mut counter: DistinctCounter, items: &[T]) -> ComparisonRecord {
    let start = Instant::now();
    for item in items {
        counter.insert(item.as_ref());
    }
    let distinct = counter.count().round() as u64;
    ComparisonRecord {
        method: counter.name(),
        distinct,
        elapsed: start.elapsed(),
        size: counter.size_of(),
    }
}
