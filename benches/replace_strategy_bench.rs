//! Replace-strategy throughput benchmark.
//!
//! Drives a batch of strategy instances through repeated `set_items` calls:
//! INSTANCES independent strategies, each replaced CALLS times with a
//! pre-generated dataset of the given size.
//!
//! The dataset is generated once per size from a deterministic key sequence,
//! so every strategy sees identical input. Pooled strategies in one batch
//! share a single pool, as they would in an application.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use keyset::prelude::*;
use uuid::Uuid;

const SIZES: [usize; 3] = [100, 1_000, 10_000];
const INSTANCES: usize = 8;
const CALLS: usize = 4;

/// Generates `size` distinct keys spread over a few namespaces.
fn generate_dataset(size: usize) -> Vec<Option<CompositeKey>> {
    (0..size)
        .map(|index| {
            let seed = index as u128;
            Some(CompositeKey::new(
                Uuid::from_u128(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                Uuid::from_u128(seed.rotate_left(64)),
                format!("ns-{}", index % 7),
                format!("item-{index}"),
            ))
        })
        .collect()
}

/// Same as [`generate_dataset`] but with the first key repeated at the end.
fn generate_duplicated_dataset(size: usize) -> Vec<Option<CompositeKey>> {
    let mut dataset = generate_dataset(size);
    let first = dataset.first().cloned().flatten();
    dataset.push(first);
    dataset
}

fn batch_size_for(size: usize) -> BatchSize {
    if size < 1000 {
        BatchSize::SmallInput
    } else {
        BatchSize::LargeInput
    }
}

fn build_batch(kind: StrategyKind) -> Vec<AnyStrategy<CompositeKey>> {
    let pool = Arc::new(BufferPool::new());
    (0..INSTANCES)
        .map(|_| kind.build(ReplaceConfig::default(), Arc::clone(&pool)))
        .collect()
}

fn benchmark_replace_distinct(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("replace_distinct");

    for size in SIZES {
        let dataset = generate_dataset(size);
        for kind in StrategyKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.name(), size),
                &size,
                |bencher, &size| {
                    bencher.iter_batched(
                        || build_batch(kind),
                        |mut batch| {
                            for strategy in &mut batch {
                                for _ in 0..CALLS {
                                    black_box(strategy.set_items(black_box(&dataset))).ok();
                                }
                            }
                            batch
                        },
                        batch_size_for(size),
                    );
                },
            );
        }
    }

    group.finish();
}

fn benchmark_replace_duplicate(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("replace_duplicate");

    for size in SIZES {
        let dataset = generate_duplicated_dataset(size);
        for kind in StrategyKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.name(), size),
                &size,
                |bencher, &size| {
                    bencher.iter_batched(
                        || build_batch(kind),
                        |mut batch| {
                            for strategy in &mut batch {
                                for _ in 0..CALLS {
                                    black_box(strategy.set_items(black_box(&dataset))).ok();
                                }
                            }
                            batch
                        },
                        batch_size_for(size),
                    );
                },
            );
        }
    }

    group.finish();
}

fn benchmark_replace_unknown_length(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("replace_unknown_length");

    for size in SIZES {
        let dataset = generate_dataset(size);
        for kind in [StrategyKind::PooledSortScan, StrategyKind::PooledSetDistinctCount] {
            group.bench_with_input(
                BenchmarkId::new(kind.name(), size),
                &size,
                |bencher, &size| {
                    bencher.iter_batched(
                        || build_batch(kind),
                        |mut batch| {
                            for strategy in &mut batch {
                                for _ in 0..CALLS {
                                    let items = dataset.iter().cloned().filter(Option::is_some);
                                    black_box(strategy.set_items(from_iter(items))).ok();
                                }
                            }
                            batch
                        },
                        batch_size_for(size),
                    );
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_replace_distinct,
    benchmark_replace_duplicate,
    benchmark_replace_unknown_length
);
criterion_main!(benches);
