//! A size-class segregated free-list allocator backing this workspace's
//! containers.
//!
//! This crate provides [`BytePool`], an owned allocation context that serves
//! small memory blocks from 56 size-segregated free lists refilled in batches
//! from a contiguous arena, and delegates everything else to the system
//! allocator.
//!
//! # Key Features
//!
//! - **O(1) allocate/deallocate** for warm size classes: a freed block goes
//!   back to the head of its class's list and the next request of any size
//!   in the same class pops it straight off again
//! - **In-place free lists**: a free block's own first bytes carry the link
//!   to the next free block, so bookkeeping costs no extra memory
//! - **Batched arena carving**: an empty class is refilled by carving a
//!   batch of blocks (10 by default) off the arena in one step
//! - **Graceful degradation**: when the system allocator refuses to grow the
//!   arena, a free block from a larger class is repurposed as a miniature
//!   arena before the request is failed
//! - **Explicit ownership**: the pool is a value, not process-wide state;
//!   dropping it returns every arena chunk to the system allocator
//!
//! # Example
//!
//! ```rust
//! use std::alloc::Layout;
//!
//! use byte_pool::BytePool;
//!
//! let mut pool = BytePool::new();
//! let layout = Layout::from_size_align(48, 8).unwrap();
//!
//! let block = pool.allocate(layout);
//! // SAFETY: `block` came from this pool with this exact layout.
//! unsafe { pool.deallocate(block, layout) };
//!
//! // The first allocation carved a batch of 10 blocks; the freed one is
//! // back in the class's list alongside the 9 spares.
//! assert_eq!(pool.free_block_count(48), 10);
//! ```
//!
//! # Limitations
//!
//! The free-list path guarantees only [`BLOCK_ALIGN`]-byte alignment, and a
//! block must be returned with the exact layout it was allocated with; both
//! are preconditions, not checked errors. `reallocate` never preserves
//! contents - it is deallocate-then-allocate, nothing more.

mod builder;
mod error;
mod pool;
mod size_class;

pub use builder::*;
pub use error::AllocError;
pub(crate) use error::Result;
pub use pool::BytePool;
pub use size_class::{BLOCK_ALIGN, CLASS_COUNT, SMALL_BLOCK_LIMIT, round_up};
