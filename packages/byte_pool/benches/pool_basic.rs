//! Basic benchmarks for the `byte_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::alloc::Layout;
use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use byte_pool::BytePool;
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

const TEST_LAYOUT: Layout = match Layout::from_size_align(64, 8) {
    Ok(layout) => layout,
    Err(_) => unreachable!(),
};

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("pool_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(BytePool::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("allocate_first");
    group.bench_function("allocate_first", |b| {
        b.iter_custom(|iters| {
            let mut pools = iter::repeat_with(BytePool::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for pool in &mut pools {
                _ = black_box(pool.allocate(black_box(TEST_LAYOUT)));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("allocate_warm");
    group.bench_function("allocate_warm", |b| {
        b.iter_custom(|iters| {
            let mut pool = BytePool::new();

            // Warm the class so every measured allocation is a list pop.
            let warmup = pool.allocate(TEST_LAYOUT);
            // SAFETY: the block came from this pool with this layout.
            unsafe { pool.deallocate(warmup, TEST_LAYOUT) };

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let block = black_box(pool.allocate(black_box(TEST_LAYOUT)));
                // SAFETY: the block came from this pool with this layout.
                unsafe { pool.deallocate(block, TEST_LAYOUT) };
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
