use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use tidecache::{Cache, CacheExt, FifoCache, LfuCache, LruCache, NullCache, TimedCache};

const CACHE_SIZE: usize = 1000;

fn filled<C: Cache<usize, usize>>(cache: C) -> C {
    for i in 0..CACHE_SIZE {
        cache.put(i, i);
    }
    cache
}

/// Hit, miss and overwrite costs for one cache.
fn bench_basic_ops<C: Cache<usize, usize>>(c: &mut Criterion, name: &str, cache: C) {
    let cache = filled(cache);
    let mut group = c.benchmark_group("Cache Operations");

    group.bench_function(format!("{name} get hit"), |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(cache.get(&(i % CACHE_SIZE)));
            }
        });
    });

    group.bench_function(format!("{name} get miss"), |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(cache.get(&(i + CACHE_SIZE)));
            }
        });
    });

    group.bench_function(format!("{name} put existing"), |b| {
        b.iter(|| {
            for i in 0..100 {
                cache.put(i % CACHE_SIZE, i);
            }
        });
    });

    group.bench_function(format!("{name} get_or_insert hit"), |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(cache.get_or_insert_with(i % CACHE_SIZE, || i));
            }
        });
    });

    group.finish();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_basic_ops(c, "FIFO", FifoCache::new(CACHE_SIZE, Duration::ZERO));
    bench_basic_ops(c, "LRU", LruCache::new(CACHE_SIZE, Duration::ZERO));
    bench_basic_ops(c, "LFU", LfuCache::new(CACHE_SIZE, Duration::ZERO));
    bench_basic_ops(c, "Timed", TimedCache::new(Duration::from_secs(600)));
    bench_basic_ops(c, "None", NullCache::new());
}

/// Full prune passes, including the eviction at capacity.
pub fn prune_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prune");

    group.bench_function("FIFO prune at capacity", |b| {
        b.iter_batched(
            || filled(FifoCache::new(CACHE_SIZE, Duration::ZERO)),
            |cache| black_box(cache.prune()),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("LFU prune at capacity", |b| {
        b.iter_batched(
            || {
                let cache = filled(LfuCache::new(CACHE_SIZE, Duration::ZERO));
                for i in 0..CACHE_SIZE {
                    for _ in 0..(i % 7) {
                        cache.get(&i);
                    }
                }
                cache
            },
            |cache| black_box(cache.prune()),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("Timed prune nothing expired", |b| {
        let cache = filled(TimedCache::new(Duration::from_secs(600)));
        b.iter(|| black_box(cache.prune()));
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark, prune_benchmark);
criterion_main!(benches);
