//! Basic benchmarks for the single-threaded `CircularBuffer` and `FixedPool` operations.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use circulate::{CircularBuffer, FixedPool};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = u64;
const TEST_VALUE: TestItem = 1024;
const CAPACITY: usize = 1024;
const BATCH: usize = 64;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("circulate_basic");

    group.bench_function("enqueue_dequeue", |b| {
        b.iter_custom(|iters| {
            let mut buffer = CircularBuffer::<TestItem>::new(CAPACITY);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(buffer.enqueue(black_box(TEST_VALUE)));
                _ = black_box(buffer.dequeue());
            }

            start.elapsed()
        });
    });

    group.bench_function("enqueue_many_dequeue_many", |b| {
        let values = [TEST_VALUE; BATCH];
        let mut out = [0; BATCH];

        b.iter_custom(|iters| {
            let mut buffer = CircularBuffer::<TestItem>::new(CAPACITY);

            // Offset the head so that batches regularly straddle the wrap point.
            buffer.enqueue_many(values.get(..BATCH / 2).unwrap());

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(buffer.enqueue_many(black_box(&values)));
                _ = black_box(buffer.dequeue_many(black_box(&mut out)));
            }

            start.elapsed()
        });
    });

    group.bench_function("linearize_wrapped", |b| {
        b.iter_custom(|iters| {
            let mut buffers = (0..iters)
                .map(|_| {
                    let mut buffer = CircularBuffer::<TestItem>::new(CAPACITY);
                    buffer.fill(TEST_VALUE);
                    for _ in 0..CAPACITY / 3 {
                        _ = buffer.dequeue();
                        _ = buffer.enqueue(TEST_VALUE);
                    }
                    buffer
                })
                .collect::<Vec<_>>();

            let start = Instant::now();

            for buffer in &mut buffers {
                buffer.linearize();
            }

            start.elapsed()
        });
    });

    group.bench_function("copy_max_to_others", |b| {
        b.iter_custom(|iters| {
            let mut source = CircularBuffer::<TestItem>::new(CAPACITY);
            let mut fast = CircularBuffer::<TestItem>::new(CAPACITY);
            let mut slow = CircularBuffer::<TestItem>::new(CAPACITY / 4);

            let start = Instant::now();

            for _ in 0..iters {
                source.fill(TEST_VALUE);
                _ = black_box(source.copy_max_to_others(&mut [&mut fast, &mut slow]));
                fast.clear();
                slow.clear();
            }

            start.elapsed()
        });
    });

    group.bench_function("pool_create_destroy", |b| {
        b.iter_custom(|iters| {
            let pool = FixedPool::<TestItem>::new(CAPACITY);

            let start = Instant::now();

            for _ in 0..iters {
                let key = pool.create().unwrap();
                pool.destroy(black_box(key));
            }

            start.elapsed()
        });
    });

    group.bench_function("pool_create_destroy_unlocked", |b| {
        b.iter_custom(|iters| {
            let mut pool = FixedPool::<TestItem>::new(CAPACITY);

            let start = Instant::now();

            for _ in 0..iters {
                let key = pool.create_unlocked().unwrap();
                pool.destroy_unlocked(black_box(key));
            }

            start.elapsed()
        });
    });

    group.finish();
}
