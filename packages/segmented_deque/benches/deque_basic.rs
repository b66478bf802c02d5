//! Basic benchmarks for the `segmented_deque` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use segmented_deque::SegmentedDeque;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

const DEQUE_SIZE: usize = 10_000;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("deque_basic");

    let allocs_op = allocs.operation("push_back_10k");
    group.bench_function("push_back_10k", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut deque = SegmentedDeque::new();
                for value in 0..DEQUE_SIZE {
                    deque.push_back(black_box(value));
                }
                drop(black_box(deque));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_front_10k");
    group.bench_function("push_front_10k", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut deque = SegmentedDeque::new();
                for value in 0..DEQUE_SIZE {
                    deque.push_front(black_box(value));
                }
                drop(black_box(deque));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("random_access");
    group.bench_function("random_access", |b| {
        b.iter_custom(|iters| {
            let deque: SegmentedDeque<usize> = (0..DEQUE_SIZE).collect();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for i in 0..iters {
                let index = (i as usize).wrapping_mul(7919) % DEQUE_SIZE;
                _ = black_box(deque[black_box(index)]);
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_pop_cycle_warm");
    group.bench_function("push_pop_cycle_warm", |b| {
        b.iter_custom(|iters| {
            let mut deque: SegmentedDeque<usize> = (0..DEQUE_SIZE).collect();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for i in 0..iters {
                deque.push_back(black_box(i as usize));
                _ = black_box(deque.pop_front());
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
