#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use distinct_sketch::{CardinalityEstimator, ExactCounter, DistinctCount, MembershipFilter};
use hyperloglogplus::{HyperLogLog, HyperLogLogPlus};
use std::hash::BuildHasherDefault;
use tabled::{
    settings::{Settings, Style},
    Table, Tabled,
};
use wyhash::WyHash;

#[derive(Tabled)]
struct Record {
    cardinality: usize,
    membership_filter: String,
    probabilistic_collections_bloom: String,
    cardinality_estimator: String,
    hyperloglogplus: String,
    exact_counter: String,
}

/// Return `size_of::<T>() / total heap bytes / total heap blocks` after `cardinality` inserts
fn measure_memory_usage<T>(
    cardinality: usize,
    create: impl Fn() -> T,
    insert: impl Fn(&mut T, &usize),
) -> (usize, String)
where
    T: Sized,
{
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut structure = create();
    for i in 0..cardinality {
        insert(&mut structure, &i);
    }
    let stats = dhat::HeapStats::get();
    (
        stats.total_bytes as usize,
        format!(
            "{} / {} / {}",
            std::mem::size_of::<T>(),
            stats.total_bytes,
            stats.total_blocks
        ),
    )
}

#[test]
fn test_allocations() {
    let mut filter_bytes = Vec::new();
    let mut estimator_bytes = Vec::new();

    let results: Vec<Record> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= 1 << 16)
        .map(|cardinality| {
            let (bytes, membership_filter) = measure_memory_usage(
                cardinality,
                || MembershipFilter::with_false_positive_rate(1 << 16, 0.01),
                |f, i| f.add(&i.to_le_bytes()),
            );
            filter_bytes.push(bytes);

            let (bytes, cardinality_estimator) = measure_memory_usage(
                cardinality,
                || CardinalityEstimator::new(12),
                |e, i| e.add(&i.to_le_bytes()),
            );
            estimator_bytes.push(bytes);

            Record {
                cardinality,
                membership_filter,
                probabilistic_collections_bloom: measure_memory_usage(
                    cardinality,
                    || probabilistic_collections::bloom::BloomFilter::<usize>::new(1 << 16, 0.01),
                    |f, i| f.insert(i),
                )
                .1,
                cardinality_estimator,
                hyperloglogplus: measure_memory_usage(
                    cardinality,
                    || {
                        HyperLogLogPlus::<usize, _>::new(
                            12,
                            BuildHasherDefault::<WyHash>::default(),
                        )
                        .unwrap()
                    },
                    |e, i| e.insert(i),
                )
                .1,
                exact_counter: measure_memory_usage(cardinality, ExactCounter::new, |c, i| {
                    c.insert(&i.to_le_bytes())
                })
                .1,
            }
        })
        .collect();

    // both sketches allocate once up front, whatever the cardinality
    assert!(filter_bytes.windows(2).all(|w| w[0] == w[1]));
    assert!(estimator_bytes.windows(2).all(|w| w[0] == w[1]));

    let table_config = Settings::default().with(Style::markdown());
    let markdown = Table::new(results).with(table_config).to_string();
    println!("{}", markdown);
}
