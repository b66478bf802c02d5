use std::num::NonZero;

use crate::BytePool;
use crate::pool::DEFAULT_BLOCKS_PER_REFILL;

/// Builder for creating an instance of [`BytePool`].
///
/// You only need to use this builder if you want to customize the pool
/// configuration. The default configuration used by [`BytePool::new()`][1]
/// is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use byte_pool::BytePool;
///
/// let pool = BytePool::builder()
///     .blocks_per_refill(NonZero::new(16).unwrap())
///     .build();
/// ```
///
/// [1]: BytePool::new
#[derive(Debug)]
#[must_use]
pub struct BytePoolBuilder {
    blocks_per_refill: NonZero<usize>,
}

impl BytePoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            blocks_per_refill: DEFAULT_BLOCKS_PER_REFILL,
        }
    }

    /// Sets how many blocks a free-list refill carves from the arena at
    /// once.
    ///
    /// Larger batches amortize arena bookkeeping over more allocations at
    /// the cost of holding more memory per partially used class; the
    /// default of 10 matches the classic segregated-storage design.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZero;
    ///
    /// use byte_pool::BytePool;
    ///
    /// let pool = BytePool::builder()
    ///     .blocks_per_refill(NonZero::new(1).unwrap())
    ///     .build();
    /// ```
    pub fn blocks_per_refill(mut self, blocks: NonZero<usize>) -> Self {
        self.blocks_per_refill = blocks;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use byte_pool::BytePool;
    ///
    /// let pool = BytePool::builder().build();
    /// ```
    #[must_use]
    pub fn build(self) -> BytePool {
        BytePool::new_inner(self.blocks_per_refill)
    }
}
