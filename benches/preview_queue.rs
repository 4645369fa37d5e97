//! Queue and cache benchmarks.
//!
//! Measures priority queue throughput and the synchronous pieces of the
//! batch loader: chunking and cache lookups.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use youvi_core::loader::{BatchConfig, ResultCache};
use youvi_core::scheduler::{Priority, PriorityQueue};

fn bench_priority_queue_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue_push");

    for (name, queue_size) in [("empty", 0), ("half_full", 50), ("near_full", 90)] {
        let mut queue: PriorityQueue<u64> = PriorityQueue::new();

        for i in 0..queue_size {
            queue.push(i as u64, Priority::NORMAL);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("push", name), |b| {
            let mut id = queue_size as u64;
            b.iter(|| {
                queue.push(black_box(id), Priority::NORMAL);
                id += 1;
                let _ = queue.pop();
            })
        });
    }

    group.finish();
}

fn bench_priority_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_ordering");

    group.throughput(Throughput::Elements(10));
    group.bench_function("mixed_priority_10", |b| {
        b.iter(|| {
            let mut queue: PriorityQueue<u64> = PriorityQueue::new();
            for i in 0..10u64 {
                let priority = match i % 3 {
                    0 => Priority::LOW,
                    1 => Priority::NORMAL,
                    _ => Priority::HIGH,
                };
                queue.push(i, priority);
            }
            while let Some(item) = queue.pop() {
                black_box(item);
            }
        })
    });

    group.bench_function("subject_change_clear_50", |b| {
        b.iter(|| {
            let mut queue: PriorityQueue<u64> = PriorityQueue::new();
            for i in 0..50u64 {
                queue.push(i, Priority::NORMAL);
            }
            black_box(queue.clear())
        })
    });

    group.finish();
}

fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_chunking");
    let config = BatchConfig::default();

    for keys in [5usize, 50, 500] {
        group.throughput(Throughput::Elements(keys as u64));
        group.bench_with_input(BenchmarkId::new("create_chunks", keys), &keys, |b, &keys| {
            b.iter(|| {
                let items: Vec<String> = (0..keys).map(|i| format!("chan-{i}")).collect();
                black_box(config.create_chunks(items))
            })
        });
    }

    group.finish();
}

fn bench_cache_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_cache");

    let mut cache: ResultCache<String> = ResultCache::new();
    for i in 0..1000 {
        let value = (i % 2 == 0).then(|| format!("blob:avatars/chan-{i}.jpg"));
        cache.insert(format!("chan-{i}"), value);
    }

    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| b.iter(|| black_box(cache.get("chan-500"))));
    group.bench_function("miss", |b| b.iter(|| black_box(cache.get("chan-missing"))));
    group.bench_function("stats_1000", |b| b.iter(|| black_box(cache.stats())));

    group.finish();
}

criterion_group!(
    benches,
    bench_priority_queue_push,
    bench_priority_ordering,
    bench_chunking,
    bench_cache_lookup
);
criterion_main!(benches);
