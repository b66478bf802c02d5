use std::alloc::{Layout, alloc, dealloc};
use std::num::NonZero;
use std::ptr::NonNull;

use new_zealand::nz;

use crate::size_class::{
    BLOCK_ALIGN, CLASS_COUNT, SMALL_BLOCK_LIMIT, block_size, class_fitting, class_of, round_up,
};
use crate::{AllocError, BytePoolBuilder, Result};

/// Blocks carved per free-list refill unless overridden via the builder.
pub(crate) const DEFAULT_BLOCKS_PER_REFILL: NonZero<usize> = nz!(10);

/// A free block reinterpreted in place as a link in its size class's list.
///
/// The block's own first bytes carry the pointer to the next free block, so
/// list bookkeeping costs no memory beyond the blocks themselves. A block is
/// either linked here or handed out to a caller, never both.
#[repr(C)]
struct FreeNode {
    next: Option<NonNull<FreeNode>>,
}

/// A size-class segregated free-list allocator.
///
/// The pool owns an arena of memory chunks obtained from the system allocator
/// and carves them into fixed-size blocks on demand. Requests of up to
/// [`SMALL_BLOCK_LIMIT`] bytes (with alignment up to [`BLOCK_ALIGN`]) are
/// rounded up to one of 56 size classes and served from that class's free
/// list in O(1); anything larger, or more strongly aligned, is delegated to
/// the system allocator.
///
/// Freed blocks return to their class's list and are reused in LIFO order,
/// so a steady allocate/deallocate workload stops touching the system
/// allocator entirely after warmup.
///
/// The pool is an explicit context object: each container owns one (or
/// shares one through external means) rather than reaching for process-wide
/// state. Dropping the pool returns every arena chunk to the system
/// allocator, so all blocks obtained from it must be returned (or at least
/// abandoned) first.
///
/// # Example
///
/// ```rust
/// use std::alloc::Layout;
///
/// use byte_pool::BytePool;
///
/// let mut pool = BytePool::new();
/// let layout = Layout::from_size_align(100, 8).unwrap();
///
/// let block = pool.allocate(layout);
///
/// // ... use the block ...
///
/// // SAFETY: `block` came from this pool with this exact layout.
/// unsafe { pool.deallocate(block, layout) };
/// ```
#[derive(Debug)]
pub struct BytePool {
    /// Head of each size class's singly-linked list of free blocks.
    free_lists: [Option<NonNull<FreeNode>>; CLASS_COUNT],

    /// Start of the unconsumed tail of the current arena chunk, if any.
    arena_cursor: Option<NonNull<u8>>,

    /// Bytes remaining in the current arena chunk from `arena_cursor` on.
    arena_remaining: usize,

    /// Cumulative bytes ever requested from the system for arena chunks.
    /// Scales the slack added to future chunk requests so long-lived pools
    /// refill less often.
    heap_bytes: usize,

    /// Every chunk obtained from the system allocator, retained so `drop`
    /// can return them. A cannibalized free block never appears here; it
    /// lives inside an already-listed chunk.
    chunks: Vec<(NonNull<u8>, Layout)>,

    /// Blocks carved per free-list refill.
    blocks_per_refill: NonZero<usize>,

    /// Allocations currently outstanding (small and delegated alike).
    live_blocks: usize,
}

impl BytePool {
    #[must_use]
    pub(crate) fn new_inner(blocks_per_refill: NonZero<usize>) -> Self {
        Self {
            free_lists: [None; CLASS_COUNT],
            arena_cursor: None,
            arena_remaining: 0,
            heap_bytes: 0,
            chunks: Vec::new(),
            blocks_per_refill,
            live_blocks: 0,
        }
    }

    /// Creates a new [`BytePool`] with the default configuration.
    ///
    /// The pool starts without an arena; the first small allocation triggers
    /// the first chunk request.
    ///
    /// # Example
    ///
    /// ```rust
    /// use byte_pool::BytePool;
    ///
    /// let pool = BytePool::new();
    /// assert_eq!(pool.chunk_count(), 0);
    /// assert_eq!(pool.live_block_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`BytePool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the
    /// defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::NonZero;
    ///
    /// use byte_pool::BytePool;
    ///
    /// let pool = BytePool::builder()
    ///     .blocks_per_refill(NonZero::new(4).unwrap())
    ///     .build();
    /// ```
    pub fn builder() -> BytePoolBuilder {
        BytePoolBuilder::new()
    }

    /// Whether this layout bypasses the free lists entirely.
    ///
    /// The free-list path guarantees only [`BLOCK_ALIGN`] alignment and tops
    /// out at [`SMALL_BLOCK_LIMIT`] bytes; everything else belongs to the
    /// system allocator.
    fn is_direct(layout: Layout) -> bool {
        layout.size() > SMALL_BLOCK_LIMIT || layout.align() > BLOCK_ALIGN
    }

    /// Allocates a block satisfying `layout`.
    ///
    /// Small, ordinarily aligned layouts are served from the matching size
    /// class (refilling it from the arena when empty); the rest is delegated
    /// to the system allocator. The returned block is uninitialized.
    ///
    /// # Panics
    ///
    /// Panics if `layout` is zero-sized, or on out-of-memory once every
    /// fallback (arena growth, free-block cannibalization) is exhausted. Use
    /// [`try_allocate`][Self::try_allocate] to handle exhaustion instead.
    #[must_use]
    pub fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        self.try_allocate(layout)
            .expect("we do not intend to handle allocation failure as a real possibility - OOM is panic")
    }

    /// Allocates a block satisfying `layout`, reporting exhaustion as an
    /// error instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] when the system allocator refuses
    /// to grow the arena and no free block large enough to repurpose exists.
    /// The failure leaves every size class intact; unrelated allocations are
    /// unaffected.
    ///
    /// # Panics
    ///
    /// Panics if `layout` is zero-sized.
    pub fn try_allocate(&mut self, layout: Layout) -> Result<NonNull<u8>> {
        assert!(
            layout.size() > 0,
            "BytePool cannot allocate zero-sized blocks"
        );

        if Self::is_direct(layout) {
            // SAFETY: the layout is non-zero-sized per the assertion above.
            let ptr = unsafe { alloc(layout) };

            let block = NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
                requested: layout.size(),
            })?;
            self.count_live_block();
            return Ok(block);
        }

        let class = class_of(layout.size());
        let block = match self.pop_free(class) {
            Some(block) => block,
            None => self.refill(round_up(layout.size()))?,
        };

        self.count_live_block();
        Ok(block)
    }

    /// Returns a block previously obtained from [`allocate`][Self::allocate]
    /// or [`try_allocate`][Self::try_allocate].
    ///
    /// Small blocks are pushed back onto their size class's free list in
    /// O(1); delegated blocks are returned to the system allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this pool for this exact `layout` and
    /// must not be used afterwards. Passing a different layout than the one
    /// used at allocation files the block under the wrong size class and
    /// corrupts it for every future caller; this is not a checked error.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        assert!(
            layout.size() > 0,
            "BytePool cannot deallocate zero-sized blocks"
        );

        self.live_blocks = self
            .live_blocks
            .checked_sub(1)
            .expect("deallocate was called more times than allocate");

        if Self::is_direct(layout) {
            // SAFETY: caller contract - the block came from `allocate` with
            // this exact layout, which routed it to the system allocator.
            unsafe { dealloc(ptr.as_ptr(), layout) };
            return;
        }

        self.push_free(class_of(layout.size()), ptr);
    }

    /// Releases a block and allocates a fresh one for `new_layout`.
    ///
    /// The contents of the old block are *not* carried over; this is a
    /// deliberate simplification (there is no shrink- or grow-in-place), and
    /// callers who need the old bytes must copy them out first. With equal
    /// layouts the same block typically comes straight back, courtesy of the
    /// LIFO free list.
    ///
    /// # Safety
    ///
    /// Same contract as [`deallocate`][Self::deallocate]: `ptr` must have
    /// been returned by this pool for exactly `old_layout`.
    ///
    /// # Panics
    ///
    /// Panics on out-of-memory, like [`allocate`][Self::allocate].
    #[must_use]
    pub unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> NonNull<u8> {
        // SAFETY: forwarding the caller's contract.
        unsafe { self.deallocate(ptr, old_layout) };
        self.allocate(new_layout)
    }

    /// The number of free blocks currently listed for the class serving
    /// `size`-byte requests.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or exceeds [`SMALL_BLOCK_LIMIT`].
    #[must_use]
    pub fn free_block_count(&self, size: usize) -> usize {
        let mut count: usize = 0;
        let mut cursor = *self
            .free_lists
            .get(class_of(size))
            .expect("class_of always returns an index below CLASS_COUNT");

        while let Some(node) = cursor {
            // Cannot overflow: each free block occupies at least 8 distinct
            // bytes of address space.
            count = count.wrapping_add(1);
            // SAFETY: every node in a free list was written by `push_free`
            // and stays valid until popped, which we do not do here.
            cursor = unsafe { node.as_ref().next };
        }

        count
    }

    /// Bytes left in the current arena chunk.
    #[must_use]
    pub fn arena_remaining(&self) -> usize {
        self.arena_remaining
    }

    /// The number of chunks obtained from the system allocator so far.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Cumulative bytes ever requested from the system for arena chunks.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn heap_bytes(&self) -> usize {
        self.heap_bytes
    }

    /// Allocations currently outstanding, small and delegated alike.
    #[must_use]
    pub fn live_block_count(&self) -> usize {
        self.live_blocks
    }

    fn count_live_block(&mut self) {
        // Cannot overflow: each live block occupies at least 8 distinct
        // bytes of address space, which runs out of usize range first.
        self.live_blocks = self.live_blocks.wrapping_add(1);
    }

    fn push_free(&mut self, class: usize, ptr: NonNull<u8>) {
        let head = self
            .free_lists
            .get_mut(class)
            .expect("class index is always below CLASS_COUNT");

        debug_assert!(
            ptr.as_ptr().addr() % BLOCK_ALIGN == 0,
            "free block is not {BLOCK_ALIGN}-byte aligned"
        );

        let node = ptr.cast::<FreeNode>();
        // SAFETY: every class's block is at least 8 bytes and 8-aligned, and
        // the block is exclusively ours from this point on, so its first
        // bytes may carry the link.
        unsafe {
            node.as_ptr().write(FreeNode { next: *head });
        }
        *head = Some(node);
    }

    fn pop_free(&mut self, class: usize) -> Option<NonNull<u8>> {
        let head = self
            .free_lists
            .get_mut(class)
            .expect("class index is always below CLASS_COUNT");

        let node = (*head)?;
        // SAFETY: nodes in a free list were written by `push_free` and stay
        // valid until popped; we are popping this one, taking back ownership
        // of the whole block.
        *head = unsafe { node.as_ref().next };
        Some(node.cast())
    }

    /// Replenishes the class serving `size`-byte blocks and returns one of
    /// the new blocks. `size` must already be rounded to a class boundary.
    ///
    /// Carves up to `blocks_per_refill` blocks from the arena; the first goes
    /// to the caller, the rest are linked into the free list. The arena may
    /// shrink the batch when it cannot cover the full request.
    fn refill(&mut self, size: usize) -> Result<NonNull<u8>> {
        debug_assert_eq!(size, round_up(size), "refill size must be a class boundary");

        let mut nblock = self.blocks_per_refill.get();
        let chunk = self.chunk_alloc(size, &mut nblock)?;

        if nblock == 1 {
            return Ok(chunk);
        }

        let class = class_of(size);
        // Link blocks 1..nblock in reverse so the list ends up in ascending
        // address order; block 0 goes to the caller.
        for index in (1..nblock).rev() {
            // Cannot overflow: the product stays within the chunk we carved.
            let offset = index.wrapping_mul(size);
            // SAFETY: the chunk spans nblock * size bytes, so block `index`
            // starts in bounds.
            let block = unsafe { chunk.add(offset) };
            self.push_free(class, block);
        }

        Ok(chunk)
    }

    /// Obtains storage for `*nblock` blocks of `size` bytes, shrinking
    /// `*nblock` if the arena can only cover part of the request.
    ///
    /// Fallback order: carve the whole batch from the arena; carve whatever
    /// whole blocks fit; salvage the arena tail into its free list, grow the
    /// arena (from the system allocator, else by cannibalizing a larger
    /// class's free block) and try again.
    fn chunk_alloc(&mut self, size: usize, nblock: &mut usize) -> Result<NonNull<u8>> {
        let need = size
            .checked_mul(*nblock)
            .expect("a refill batch is bounded by blocks_per_refill * SMALL_BLOCK_LIMIT");

        if self.arena_remaining >= need {
            return Ok(self.carve(need));
        }

        if self.arena_remaining >= size {
            *nblock = self
                .arena_remaining
                .checked_div(size)
                .expect("class block sizes are never zero");
            let partial = size
                .checked_mul(*nblock)
                .expect("the shrunken batch fits the arena, which fits usize");
            return Ok(self.carve(partial));
        }

        // Not even one block fits. Retire the current chunk's tail into a
        // free list, acquire a new chunk and carve from that instead.
        self.salvage_arena_tail();
        self.grow_arena(size, need)?;
        self.chunk_alloc(size, nblock)
    }

    /// Hands out the first `bytes` of the arena and advances the cursor.
    fn carve(&mut self, bytes: usize) -> NonNull<u8> {
        debug_assert!(bytes <= self.arena_remaining);

        let start = self
            .arena_cursor
            .expect("carve is only called when the arena holds enough bytes");

        // SAFETY: `bytes <= arena_remaining`, so the advanced cursor stays
        // within (or one past) the chunk allocation.
        self.arena_cursor = Some(unsafe { start.add(bytes) });
        self.arena_remaining = self
            .arena_remaining
            .checked_sub(bytes)
            .expect("guarded by the debug assertion above: bytes <= arena_remaining");

        start
    }

    /// Files the unusable tail of the current chunk under the largest size
    /// class that fits it, then abandons the chunk.
    ///
    /// Tails smaller than the smallest class (or the sub-class remainder
    /// after rounding down) are simply wasted; they stay inside an owned
    /// chunk and are reclaimed when the pool is dropped.
    fn salvage_arena_tail(&mut self) {
        if let Some(class) = class_fitting(self.arena_remaining) {
            let block = self.carve(block_size(class));
            self.push_free(class, block);
        }

        self.arena_cursor = None;
        self.arena_remaining = 0;
    }

    /// Points the arena at fresh storage able to hold at least one
    /// `size`-byte block.
    ///
    /// Asks the system allocator for `2 * need` bytes plus slack scaled by
    /// cumulative growth; if that fails, scans every class that serves
    /// `size` or more for a free block to repurpose as a miniature arena.
    fn grow_arena(&mut self, size: usize, need: usize) -> Result<()> {
        let slack = round_up(self.heap_bytes >> 4);
        let bytes = need
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(slack))
            .expect("arena growth request cannot exceed usize: need and slack are far below half the address space");

        let layout = Layout::from_size_align(bytes, BLOCK_ALIGN)
            .expect("arena chunk layout is always valid: non-zero size, small power-of-two alignment");

        // SAFETY: the layout is non-zero-sized (need covers at least one
        // block of a non-empty class).
        let ptr = unsafe { alloc(layout) };

        if let Some(chunk) = NonNull::new(ptr) {
            self.chunks.push((chunk, layout));
            self.arena_cursor = Some(chunk);
            self.arena_remaining = bytes;
            self.heap_bytes = self
                .heap_bytes
                .checked_add(bytes)
                .expect("cumulative arena growth cannot exceed usize before the system allocator gives out");
            return Ok(());
        }

        // The system is out of memory. Any free block big enough for one
        // request can still serve as a (tiny) arena; scan the classes that
        // qualify, smallest first.
        for class in class_of(size)..CLASS_COUNT {
            if let Some(block) = self.pop_free(class) {
                self.arena_cursor = Some(block);
                self.arena_remaining = block_size(class);
                return Ok(());
            }
        }

        Err(AllocError::OutOfMemory { requested: bytes })
    }
}

impl Default for BytePool {
    /// Creates a new [`BytePool`] with the default configuration.
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BytePool {
    fn drop(&mut self) {
        for (chunk, layout) in self.chunks.drain(..) {
            // SAFETY: the chunk was obtained from `alloc` with this exact
            // layout and is freed exactly once, here.
            unsafe { dealloc(chunk.as_ptr(), layout) };
        }
    }
}

// SAFETY: The raw pointers are plain storage addresses owned by the pool;
// nothing about them is tied to a particular thread, so the pool may move
// between threads. Sharing still requires external synchronization, which
// the lack of `Sync` enforces.
unsafe impl Send for BytePool {}
