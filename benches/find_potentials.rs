//! Candidate generation and scoring benchmarks.
//!
//! Run with:
//! ```
//! cargo bench --bench find_potentials
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use kinmatch::merge::genmerges;
use kinmatch::test_support::generate_tree;
use kinmatch::{DuplicateFinder, GenealogyStore, MatchOptions, NeverCancel, PersonHandle};
use kinmatch::{NameComparator, RecordScorer};
use std::hint::black_box;
use std::time::Duration;

// =============================================================================
// CANDIDATE GENERATION
// =============================================================================

fn bench_find_potentials(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_potentials");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for person_count in [500usize, 2_000, 5_000] {
        let tree = generate_tree(person_count, 0.15, 42);
        group.throughput(Throughput::Elements(person_count as u64));

        for (label, use_soundex) in [("soundex", true), ("literal", false)] {
            let options = MatchOptions {
                use_soundex,
                ..Default::default()
            };
            group.bench_with_input(
                BenchmarkId::new(label, person_count),
                &(tree.clone(), options),
                |b, (tree, options)| {
                    b.iter_batched(
                        || DuplicateFinder::new(tree.clone(), options.clone()),
                        |mut finder| black_box(finder.find_potentials(&NeverCancel)),
                        BatchSize::SmallInput,
                    )
                },
            );
        }
    }

    group.finish();
}

/// Second run over the same finder hits the score cache.
fn bench_cached_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_potentials/cached");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));

    let person_count = 2_000usize;
    let mut finder = DuplicateFinder::new(generate_tree(person_count, 0.15, 7), MatchOptions::default());
    finder.find_potentials(&NeverCancel);

    group.throughput(Throughput::Elements(person_count as u64));
    group.bench_function(BenchmarkId::new("rescan", person_count), |b| {
        b.iter(|| black_box(finder.find_potentials(&NeverCancel)))
    });

    group.finish();
}

// =============================================================================
// MICRO BENCHMARKS
// =============================================================================

fn bench_compare_people(c: &mut Criterion) {
    let tree = generate_tree(200, 0.5, 11);
    let persons = tree.persons();
    let scorer = RecordScorer::new(&tree, NameComparator::new(true, false), 0);

    c.bench_function("compare_people/200x200", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for p1 in &persons {
                for p2 in &persons {
                    if let Some(score) = scorer.compare_people(p1, p2).score() {
                        total += score;
                    }
                }
            }
            black_box(total)
        })
    });
}

fn bench_genmerges(c: &mut Criterion) {
    let mut group = c.benchmark_group("genmerges");
    for pair_count in [1_000usize, 10_000] {
        // Chains of five handles each.
        let pairs: Vec<(PersonHandle, PersonHandle)> = (0..pair_count)
            .map(|i| {
                let base = (i / 4) * 5;
                (
                    PersonHandle::new(format!("P{:06}", base)),
                    PersonHandle::new(format!("P{:06}", base + i % 4 + 1)),
                )
            })
            .collect();
        group.throughput(Throughput::Elements(pair_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pair_count), &pairs, |b, pairs| {
            b.iter(|| black_box(genmerges(pairs)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_find_potentials,
    bench_cached_rescan,
    bench_compare_people,
    bench_genmerges,
);
criterion_main!(benches);
