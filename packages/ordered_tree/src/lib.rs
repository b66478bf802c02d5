//! A red-black tree engine with pluggable key extraction and ordering.
//!
//! This crate provides [`OrderedTree`], the balanced-tree substrate that
//! ordered map and set containers are thin wrappers over. Values are stored
//! whole; a [`KeyExtract`] policy picks the key out of each value
//! ([`Identity`] for sets, [`PairFirst`] for maps) and a [`Compare`]
//! comparator supplies the strict weak ordering.
//!
//! # Key Features
//!
//! - **Stable ids**: nodes are addressed by [`NodeId`]s into an arena, not
//!   pointers; ids survive every rotation and recoloring until their node
//!   is removed
//! - **Unique and duplicate keys**: `insert_unique` refuses an equivalent
//!   key (reporting the existing position), `insert_multi` accepts it; the
//!   wrapping container picks one discipline
//! - **Hinted insertion**: a correct hint makes insertion O(1) amortized
//!   instead of a full descent; a wrong hint degrades to the ordinary path
//! - **Ordered navigation**: `find` / `lower_bound` / `upper_bound` /
//!   `equal_range`, O(1) min/max via maintained caches, double-ended
//!   in-order iteration
//! - **Pooled node storage**: each node is one block from a
//!   [`byte_pool::BytePool`] owned by the tree, so erase/insert churn
//!   recycles blocks instead of touching the system allocator
//!
//! # Example
//!
//! ```rust
//! use ordered_tree::OrderedTree;
//!
//! let mut tree = OrderedTree::<i32>::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert_unique(key).unwrap();
//! }
//!
//! assert_eq!(
//!     tree.iter().copied().collect::<Vec<_>>(),
//!     vec![1, 3, 4, 5, 7, 8, 9]
//! );
//!
//! let id = tree.lower_bound(&6).unwrap();
//! assert_eq!(tree.get(id), &7);
//! ```

mod arena;
mod balance;
mod compare;
mod iter;
mod key_policy;
mod node;
mod tree;

pub use compare::*;
pub use iter::{IntoIter, Iter, Range};
pub use key_policy::*;
pub use node::NodeId;
pub use tree::{MapTree, OrderedTree, SetTree};
