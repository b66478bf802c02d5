//! A double-ended queue over a map of fixed-size buffers.
//!
//! This crate provides [`SegmentedDeque`], a deque whose storage is an
//! indirection map of pointers to fixed-capacity element buffers. Growth at
//! either end allocates one buffer at a time; when the map itself runs out
//! of slack it is reallocated larger and the used region recentered, so both
//! ends regain headroom. Elements never move once written (except by
//! mid-range insert/remove), unlike a ring buffer that relocates everything
//! on resize.
//!
//! # Key Features
//!
//! - **Amortized O(1) `push_front` and `push_back`**: the map keeps slack
//!   on both sides, so most pushes at worst allocate one buffer
//! - **O(1) `pop` at both ends**: a vacated buffer is released back to the
//!   pool immediately
//! - **O(1) random access**: a logical index converts to (buffer, offset)
//!   with one div/mod against the fixed buffer capacity - no stepping
//! - **Cost-aware middle edits**: `insert`/`remove` shift whichever side is
//!   shorter, O(min(i, len - i))
//! - **Pooled storage**: buffers and the map come from a
//!   [`byte_pool::BytePool`] owned by the deque, so push/pop churn recycles
//!   blocks instead of hitting the system allocator
//! - **Allocation-friendly `clear`**: exactly one buffer is kept, so a
//!   clear/refill cycle starts without allocating
//!
//! # Example
//!
//! ```rust
//! use segmented_deque::SegmentedDeque;
//!
//! let mut deque = SegmentedDeque::new();
//!
//! for value in 1..=10 {
//!     deque.push_back(value);
//! }
//! deque.push_front(0);
//!
//! assert_eq!(deque.len(), 11);
//! assert_eq!(deque.front(), Some(&0));
//! assert_eq!(deque.back(), Some(&10));
//! assert_eq!(deque[5], 5);
//!
//! assert_eq!(deque.pop_front(), Some(0));
//! assert_eq!(deque.pop_back(), Some(10));
//! ```
//!
//! # Thread safety
//!
//! The deque is `Send` when its elements are, but not `Sync`: concurrent
//! use requires external synchronization, exactly as for any `&mut`-style
//! container.

mod builder;
mod cursor;
mod deque;
mod iter;

pub use builder::*;
pub use deque::SegmentedDeque;
pub use iter::{IntoIter, Iter, IterMut};
