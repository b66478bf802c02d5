//! Basic example of using `BytePool` as a per-container allocation context.

use std::alloc::Layout;

use byte_pool::BytePool;

fn main() {
    let mut pool = BytePool::new();
    let layout = Layout::from_size_align(100, 8).unwrap();

    // The first allocation of a class carves a whole batch from the arena.
    let block = pool.allocate(layout);
    println!(
        "allocated one block; {} spares now wait in the 100-byte class",
        pool.free_block_count(100)
    );

    // SAFETY: `block` came from this pool with this exact layout.
    unsafe { pool.deallocate(block, layout) };

    // The freed block is first in line for the next request of any size
    // that rounds to the same class.
    let again = pool.allocate(Layout::from_size_align(97, 8).unwrap());
    assert_eq!(again, block);
    println!("a 97-byte request reused the same block (LIFO class reuse)");

    // SAFETY: returned with the layout it was allocated with.
    unsafe { pool.deallocate(again, Layout::from_size_align(97, 8).unwrap()) };

    println!(
        "arena chunks: {}, cumulative heap: {} bytes",
        pool.chunk_count(),
        pool.heap_bytes()
    );
}
