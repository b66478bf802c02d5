use std::marker::PhantomData;

use byte_pool::BytePool;

use crate::SegmentedDeque;

/// Builder for creating an instance of [`SegmentedDeque`].
///
/// You only need to use this builder if you want to customize the deque
/// configuration - most commonly to hand it a tuned [`BytePool`].
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use byte_pool::BytePool;
/// use segmented_deque::SegmentedDeque;
///
/// let pool = BytePool::builder()
///     .blocks_per_refill(NonZero::new(4).unwrap())
///     .build();
///
/// let deque = SegmentedDeque::<u64>::builder()
///     .pool(pool)
///     .capacity(1024)
///     .build();
///
/// assert!(deque.is_empty());
/// ```
#[must_use]
pub struct SegmentedDequeBuilder<T> {
    pool: Option<BytePool>,

    capacity: usize,

    _item: PhantomData<T>,
}

impl<T> std::fmt::Debug for SegmentedDequeBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedDequeBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> SegmentedDequeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            pool: None,
            capacity: 0,
            _item: PhantomData,
        }
    }

    /// Supplies the pool the deque allocates its map and buffers from.
    ///
    /// By default the deque builds its own pool with the default
    /// configuration.
    pub fn pool(mut self, pool: BytePool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Pre-allocates buffers for at least `capacity` elements.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the deque with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn build(self) -> SegmentedDeque<T> {
        SegmentedDeque::new_inner(self.pool.unwrap_or_default(), self.capacity)
    }
}
