use std::alloc::Layout;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};
use std::{fmt, mem};

use byte_pool::BytePool;

use crate::SegmentedDequeBuilder;
use crate::cursor::Cursor;
use crate::iter::{IntoIter, Iter, IterMut};

/// Minimum number of slots in the pointer map; also the slack added when a
/// map reallocation is sized.
pub(crate) const MAP_INIT_SIZE: usize = 8;

/// Elements per buffer: a buffer spans roughly 4096 bytes, except that
/// large element types get a fixed 16 elements each.
pub(crate) fn buffer_capacity<T>() -> usize {
    let size = size_of::<T>();
    assert!(
        size > 0,
        "SegmentedDeque must have non-zero item size"
    );

    if size < 256 { 4096 / size } else { 16 }
}

/// A double-ended queue backed by a map of fixed-size buffers.
///
/// Storage is two-level: a heap-allocated *map* of buffer pointers, each
/// pointing at a fixed-capacity element buffer. Elements occupy a contiguous
/// run of the flat grid formed by the map; pushing at either end grows into
/// the neighboring buffer (allocating it on demand), and only when the map
/// itself runs out of slack is it reallocated - larger, with the used region
/// recentered so both ends regain room. Element memory never moves, and no
/// operation ever shifts the whole content the way a ring buffer's resize
/// does.
///
/// This yields amortized O(1) `push_front`/`push_back`, O(1) `pop` at both
/// ends (releasing emptied buffers immediately), and O(1) random access via
/// div/mod arithmetic against the buffer capacity. Insertion and removal in
/// the middle shift whichever side is shorter and are O(n).
///
/// Buffers and the map itself are allocated from a [`BytePool`] owned by
/// the deque, so steady push/pop churn recycles blocks through the pool's
/// free lists instead of the system allocator.
///
/// # Example
///
/// ```rust
/// use segmented_deque::SegmentedDeque;
///
/// let mut deque = SegmentedDeque::new();
/// for value in 1..=10 {
///     deque.push_back(value);
/// }
/// deque.push_front(0);
///
/// assert_eq!(deque.len(), 11);
/// assert_eq!(deque.front(), Some(&0));
/// assert_eq!(deque.back(), Some(&10));
/// assert_eq!(deque[5], 5);
/// ```
pub struct SegmentedDeque<T> {
    /// Where the map and all buffers come from and return to.
    pool: BytePool,

    /// The pointer map: `map_size` buffer pointers. A null slot has no
    /// buffer; every slot in `begin.slot..=end.slot` is non-null, and so
    /// are any slack buffers kept around the active range.
    map: NonNull<*mut T>,

    map_size: usize,

    /// Position of the first element.
    begin: Cursor,

    /// One past the last element. Always points into an allocated buffer,
    /// so the next `push_back` has a destination without checking.
    end: Cursor,
}

impl<T> SegmentedDeque<T> {
    /// Creates an empty deque.
    ///
    /// One buffer and a minimum-size map are allocated up front, so the
    /// first pushes in either direction proceed without touching the
    /// allocator.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a deque with a custom configuration.
    pub fn builder() -> SegmentedDequeBuilder<T> {
        SegmentedDequeBuilder::new()
    }

    /// Creates an empty deque with buffers pre-allocated for at least
    /// `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::builder().capacity(capacity).build()
    }

    pub(crate) fn new_inner(mut pool: BytePool, capacity: usize) -> Self {
        let cap = buffer_capacity::<T>();

        // One buffer more than the elements strictly need, so the cursors
        // always have an allocated buffer under them.
        let buffers = capacity / cap + 1;
        let map_size = MAP_INIT_SIZE.max(buffers + 2);
        let map = Self::allocate_map(&mut pool, map_size);

        // Center the buffers so both ends start with map slack.
        let start = (map_size - buffers) / 2;

        let mut deque = Self {
            pool,
            map,
            map_size,
            begin: Cursor::new(start, 0),
            end: Cursor::new(start, 0),
        };

        for slot in start..start + buffers {
            deque.allocate_buffer_at(slot);
        }

        deque
    }

    fn capacity_per_buffer() -> usize {
        buffer_capacity::<T>()
    }

    fn map_layout(size: usize) -> Layout {
        Layout::array::<*mut T>(size).expect("a pointer map always has a calculable layout")
    }

    fn buffer_layout() -> Layout {
        Layout::array::<T>(Self::capacity_per_buffer())
            .expect("a buffer of at most a few kilobytes always has a calculable layout")
    }

    fn allocate_map(pool: &mut BytePool, size: usize) -> NonNull<*mut T> {
        let map = pool.allocate(Self::map_layout(size)).cast::<*mut T>();

        // SAFETY: the block spans `size` pointer slots; all-zero bits is
        // the null pointer, marking every slot buffer-less.
        unsafe {
            ptr::write_bytes(map.as_ptr(), 0, size);
        }

        map
    }

    /// The number of elements in the deque.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to never-terminating drain loops.
    pub fn len(&self) -> usize {
        let cap = Self::capacity_per_buffer();
        // end never precedes begin on the grid.
        self.end.linear(cap).wrapping_sub(self.begin.linear(cap))
    }

    /// Whether the deque holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The number of buffers currently allocated, active and slack alike.
    ///
    /// A popped-empty buffer is released immediately, so this shrinks as
    /// the deque drains; it is the observable for "no buffer leaks".
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        (0..self.map_size)
            .filter(|slot| !self.buffer_at(*slot).is_null())
            .count()
    }

    /// The number of slots in the pointer map.
    #[must_use]
    pub fn map_slot_count(&self) -> usize {
        self.map_size
    }

    fn buffer_at(&self, slot: usize) -> *mut T {
        debug_assert!(slot < self.map_size, "map slot {slot} out of bounds");

        // SAFETY: every slot below map_size was initialized when the map
        // was allocated and stays initialized thereafter.
        unsafe { self.map.add(slot).read() }
    }

    fn set_buffer_at(&mut self, slot: usize, buffer: *mut T) {
        debug_assert!(slot < self.map_size, "map slot {slot} out of bounds");

        // SAFETY: slot is within the map allocation per the assertion.
        unsafe {
            self.map.add(slot).write(buffer);
        }
    }

    fn allocate_buffer_at(&mut self, slot: usize) {
        if !self.buffer_at(slot).is_null() {
            // A slack buffer is already waiting here; reuse it.
            return;
        }

        let buffer = self.pool.allocate(Self::buffer_layout()).cast::<T>();
        self.set_buffer_at(slot, buffer.as_ptr());
    }

    fn free_buffer_at(&mut self, slot: usize) {
        let buffer = self.buffer_at(slot);
        if let Some(buffer) = NonNull::new(buffer) {
            // SAFETY: the buffer came from this pool with this layout and
            // holds no live elements when a slot is retired.
            unsafe {
                self.pool.deallocate(buffer.cast(), Self::buffer_layout());
            }
            self.set_buffer_at(slot, ptr::null_mut());
        }
    }

    /// Raw address of the element position `cursor`, which must lie in an
    /// allocated buffer.
    fn element_ptr(&self, cursor: Cursor) -> *mut T {
        let buffer = self.buffer_at(cursor.slot);
        debug_assert!(!buffer.is_null(), "cursor points at an absent buffer");
        debug_assert!(cursor.offset < Self::capacity_per_buffer());

        // SAFETY: the buffer spans capacity_per_buffer() elements and the
        // offset is within it.
        unsafe { buffer.add(cursor.offset) }
    }

    pub(crate) fn element_ptr_at(&self, index: usize) -> NonNull<T> {
        debug_assert!(index < self.len());

        let cursor = self.begin.advanced(index, Self::capacity_per_buffer());
        NonNull::new(self.element_ptr(cursor))
            .expect("buffers in the active range are never null")
    }

    /// Borrows the element at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }

        let cursor = self.begin.advanced(index, Self::capacity_per_buffer());
        // SAFETY: index < len, so the position holds an initialized element.
        Some(unsafe { &*self.element_ptr(cursor) })
    }

    /// Mutably borrows the element at `index`, if it exists.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }

        let cursor = self.begin.advanced(index, Self::capacity_per_buffer());
        // SAFETY: index < len, so the position holds an initialized element;
        // &mut self makes the borrow exclusive.
        Some(unsafe { &mut *self.element_ptr(cursor) })
    }

    /// Borrows the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len()`][Self::len]; anything else reads
    /// outside the live elements and is undefined behavior. This is the
    /// documented performance/safety trade of the unchecked accessor - use
    /// [`get()`][Self::get] or indexing when in doubt.
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len());

        let cursor = self.begin.advanced(index, Self::capacity_per_buffer());
        // SAFETY: caller contract - index < len.
        unsafe { &*self.element_ptr(cursor) }
    }

    /// The first element, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Mutably, the first element, if any.
    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// The last element, if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Mutably, the last element, if any.
    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.get_mut(self.len().checked_sub(1)?)
    }

    /// Appends an element at the back. Amortized O(1).
    pub fn push_back(&mut self, value: T) {
        let cap = Self::capacity_per_buffer();

        if self.end.offset != cap - 1 {
            // SAFETY: end points into an allocated buffer at a vacant slot.
            unsafe {
                self.element_ptr(self.end).write(value);
            }
            // In-buffer advance; cannot overflow cap per the branch.
            self.end.offset = self.end.offset.wrapping_add(1);
        } else {
            // Writing the buffer's last slot pushes `end` into the next
            // buffer, which must exist first.
            self.require_capacity(1, false);
            // SAFETY: as above; the position was vacant before the write.
            unsafe {
                self.element_ptr(self.end).write(value);
            }
            self.end = self.end.advanced(1, cap);
        }
    }

    /// Prepends an element at the front. Amortized O(1).
    pub fn push_front(&mut self, value: T) {
        let cap = Self::capacity_per_buffer();

        if self.begin.offset != 0 {
            self.begin.offset = self.begin.offset.wrapping_sub(1);
            // SAFETY: begin retreated within its allocated buffer onto a
            // vacant slot.
            unsafe {
                self.element_ptr(self.begin).write(value);
            }
        } else {
            self.require_capacity(1, true);
            self.begin = self.begin.retreated(1, cap);
            // SAFETY: require_capacity allocated the buffer the retreat
            // landed in; the slot is vacant.
            unsafe {
                self.element_ptr(self.begin).write(value);
            }
        }
    }

    /// Removes and returns the last element. O(1).
    ///
    /// Vacating a buffer releases it back to the pool immediately.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let cap = Self::capacity_per_buffer();

        if self.end.offset != 0 {
            self.end.offset = self.end.offset.wrapping_sub(1);
            // SAFETY: end now addresses the last element, initialized.
            Some(unsafe { self.element_ptr(self.end).read() })
        } else {
            // The last element sits at the tail of the previous buffer; the
            // buffer end used to point into is no longer needed.
            let vacated = self.end.slot;
            self.end = self.end.retreated(1, cap);
            // SAFETY: end now addresses the last element, initialized.
            let value = unsafe { self.element_ptr(self.end).read() };
            self.free_buffer_at(vacated);
            Some(value)
        }
    }

    /// Removes and returns the first element. O(1).
    ///
    /// Vacating a buffer releases it back to the pool immediately.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let cap = Self::capacity_per_buffer();

        // SAFETY: the deque is non-empty, so begin addresses an
        // initialized element.
        let value = unsafe { self.element_ptr(self.begin).read() };

        if self.begin.offset != cap - 1 {
            self.begin.offset = self.begin.offset.wrapping_add(1);
        } else {
            let vacated = self.begin.slot;
            self.begin = self.begin.advanced(1, cap);
            self.free_buffer_at(vacated);
        }

        Some(value)
    }

    /// Inserts an element at logical position `index`, shifting whichever
    /// side of the deque is shorter. O(min(index, len - index)).
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.len();
        assert!(
            index <= len,
            "insert index {index} out of bounds in deque of length {len}"
        );

        if index == 0 {
            return self.push_front(value);
        }
        if index == len {
            return self.push_back(value);
        }

        let cap = Self::capacity_per_buffer();

        if index < len / 2 {
            // Shift the shorter front segment one step outward.
            self.require_capacity(1, true);
            let new_begin = self.begin.retreated(1, cap);

            for i in 0..index {
                self.move_element(self.begin.advanced(i, cap), new_begin.advanced(i, cap));
            }
            self.begin = new_begin;

            // SAFETY: the shift vacated the position at `index`.
            unsafe {
                self.element_ptr(self.begin.advanced(index, cap)).write(value);
            }
        } else {
            // Shift the shorter back segment one step outward.
            self.require_capacity(1, false);

            for i in (index..len).rev() {
                self.move_element(self.begin.advanced(i, cap), self.begin.advanced(i.wrapping_add(1), cap));
            }
            self.end = self.end.advanced(1, cap);

            // SAFETY: the shift vacated the position at `index`.
            unsafe {
                self.element_ptr(self.begin.advanced(index, cap)).write(value);
            }
        }
    }

    /// Removes and returns the element at logical position `index`,
    /// shifting whichever side of the deque is shorter.
    /// O(min(index, len - index)).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(
            index < len,
            "remove index {index} out of bounds in deque of length {len}"
        );

        let cap = Self::capacity_per_buffer();

        // SAFETY: index < len, so the position holds an initialized element;
        // the shifts below treat it as vacated.
        let value = unsafe { self.element_ptr(self.begin.advanced(index, cap)).read() };

        if index < len / 2 {
            // Close the gap by shifting the front segment inward.
            for i in (0..index).rev() {
                self.move_element(self.begin.advanced(i, cap), self.begin.advanced(i.wrapping_add(1), cap));
            }

            let vacated = self.begin.slot;
            self.begin = self.begin.advanced(1, cap);
            if self.begin.slot != vacated {
                self.free_buffer_at(vacated);
            }
        } else {
            // Close the gap by shifting the back segment inward.
            for i in index.wrapping_add(1)..len {
                self.move_element(self.begin.advanced(i, cap), self.begin.advanced(i.wrapping_sub(1), cap));
            }

            let vacated = self.end.slot;
            self.end = self.end.retreated(1, cap);
            if self.end.slot != vacated {
                self.free_buffer_at(vacated);
            }
        }

        value
    }

    /// Drops every element, keeping exactly one buffer.
    ///
    /// Leaving a single empty buffer in place means a clear/refill cycle
    /// does not go back to the allocator for its first pushes.
    pub fn clear(&mut self) {
        self.drop_elements();
        self.end = self.begin;

        let keep = self.begin.slot;
        for slot in 0..self.map_size {
            if slot != keep {
                self.free_buffer_at(slot);
            }
        }
    }

    /// Shortens the deque to at most `new_len` elements, popping from the
    /// back.
    pub fn truncate(&mut self, new_len: usize) {
        while self.len() > new_len {
            drop(self.pop_back());
        }
    }

    /// Resizes to exactly `new_len` elements, cloning `value` into any new
    /// back positions.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        let len = self.len();
        if new_len < len {
            self.truncate(new_len);
        } else {
            for _ in len..new_len {
                self.push_back(value.clone());
            }
        }
    }

    /// Releases the slack buffers outside the active element range.
    ///
    /// Conservative capacity requests can leave extra buffers allocated
    /// around the content; this returns them to the pool. The map itself is
    /// not shrunk.
    pub fn shrink_to_fit(&mut self) {
        for slot in 0..self.begin.slot {
            self.free_buffer_at(slot);
        }
        for slot in self.end.slot.wrapping_add(1)..self.map_size {
            self.free_buffer_at(slot);
        }
    }

    /// Iterates over the elements front to back.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Mutably iterates over the elements front to back.
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }

    fn drop_elements(&mut self) {
        let cap = Self::capacity_per_buffer();
        for i in 0..self.len() {
            let cursor = self.begin.advanced(i, cap);
            // SAFETY: every position below len holds an initialized element;
            // each is dropped exactly once and the cursors are reset by the
            // callers.
            unsafe {
                ptr::drop_in_place(self.element_ptr(cursor));
            }
        }
    }

    /// Bitwise-moves one element between two allocated positions. The
    /// source is logically vacated.
    fn move_element(&mut self, from: Cursor, to: Cursor) {
        debug_assert!(from != to);

        let src = self.element_ptr(from);
        let dst = self.element_ptr(to);
        // SAFETY: distinct in-bounds positions; the source is initialized
        // and its old location is never read again without a fresh write.
        unsafe {
            ptr::copy_nonoverlapping(src, dst, 1);
        }
    }

    /// Ensures `n` more elements can be placed on the given side, creating
    /// adjacent buffers and, when the map's slack on that side is
    /// exhausted, reallocating and recentering the map.
    fn require_capacity(&mut self, n: usize, front: bool) {
        let cap = Self::capacity_per_buffer();

        if front {
            let free_slots = self.begin.offset;
            if n <= free_slots {
                return;
            }

            // Whole buffers needed ahead of the current begin buffer. The
            // +1 over-requests on exact multiples; the surplus buffer stays
            // as front slack until shrink_to_fit.
            let need = (n.wrapping_sub(free_slots) / cap).wrapping_add(1);
            if need > self.begin.slot {
                self.reallocate_map_at_front(need);
                return;
            }

            for slot in self.begin.slot.wrapping_sub(need)..self.begin.slot {
                self.allocate_buffer_at(slot);
            }
        } else {
            // One slot is reserved so `end` stays inside an allocated
            // buffer after the pushes.
            let free_slots = cap.wrapping_sub(1).wrapping_sub(self.end.offset);
            if n <= free_slots {
                return;
            }

            let need = (n.wrapping_sub(free_slots) / cap).wrapping_add(1);
            let slack = self
                .map_size
                .wrapping_sub(self.end.slot)
                .wrapping_sub(1);
            if need > slack {
                self.reallocate_map_at_back(need);
                return;
            }

            for slot in self.end.slot.wrapping_add(1)..=self.end.slot.wrapping_add(need) {
                self.allocate_buffer_at(slot);
            }
        }
    }

    /// Moves to a larger map with `need` fresh buffers ahead of the
    /// content and the whole range recentered.
    fn reallocate_map_at_front(&mut self, need: usize) {
        let (new_begin_slot, mid) = self.reallocate_map(need, true);

        for slot in new_begin_slot..mid {
            self.allocate_buffer_at(slot);
        }
    }

    /// Moves to a larger map with `need` fresh buffers behind the content
    /// and the whole range recentered.
    fn reallocate_map_at_back(&mut self, need: usize) {
        _ = self.reallocate_map(need, false);

        let first = self.end.slot.wrapping_add(1);
        for slot in first..first.wrapping_add(need) {
            self.allocate_buffer_at(slot);
        }
    }

    /// Shared map-reallocation machinery: sizes the new map to at least
    /// double, copies the active buffer pointers into its center (offset by
    /// `need` on the growing side), releases the old map and re-aims the
    /// cursors. Returns the first slot of the fresh region and the first
    /// slot of the relocated content.
    fn reallocate_map(&mut self, need: usize, front: bool) -> (usize, usize) {
        // Slack buffers do not survive a map move; the pool gets them back
        // and will serve them again if needed.
        self.shrink_to_fit();

        let old_map_size = self.map_size;
        let new_map_size = (old_map_size.wrapping_mul(2))
            .max(old_map_size.wrapping_add(need).wrapping_add(MAP_INIT_SIZE));
        let new_map = Self::allocate_map(&mut self.pool, new_map_size);

        let old_buffers = self
            .end
            .slot
            .wrapping_sub(self.begin.slot)
            .wrapping_add(1);
        let total = old_buffers.wrapping_add(need);
        let region_start = new_map_size.wrapping_sub(total) / 2;
        let content_start = if front {
            region_start.wrapping_add(need)
        } else {
            region_start
        };

        for i in 0..old_buffers {
            let buffer = self.buffer_at(self.begin.slot.wrapping_add(i));
            // SAFETY: content_start + old_buffers <= new_map_size, so the
            // destination slot is within the new map.
            unsafe {
                new_map.add(content_start.wrapping_add(i)).write(buffer);
            }
        }

        let old_map = mem::replace(&mut self.map, new_map);
        let old_layout = Self::map_layout(old_map_size);
        self.map_size = new_map_size;

        // SAFETY: the old map came from this pool with this layout; its
        // live pointers were copied out above.
        unsafe {
            self.pool.deallocate(old_map.cast(), old_layout);
        }

        self.begin.slot = content_start;
        self.end.slot = content_start.wrapping_add(old_buffers).wrapping_sub(1);

        (region_start, content_start)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &BytePool {
        &self.pool
    }
}

impl<T> Default for SegmentedDeque<T> {
    /// Creates an empty deque.
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SegmentedDeque<T> {
    fn drop(&mut self) {
        self.drop_elements();

        for slot in 0..self.map_size {
            self.free_buffer_at(slot);
        }

        // SAFETY: the map came from this pool with this layout and no
        // buffer pointer in it is live anymore.
        unsafe {
            self.pool
                .deallocate(self.map.cast(), Self::map_layout(self.map_size));
        }
    }
}

// SAFETY: The raw pointers address buffers owned by the deque; nothing ties
// them to a thread, so the deque may move between threads whenever its
// elements may. Sharing still requires external synchronization, which the
// lack of `Sync` enforces.
unsafe impl<T: Send> Send for SegmentedDeque<T> {}

impl<T> Index<usize> for SegmentedDeque<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of bounds; use [`get()`][SegmentedDeque::get]
    /// for a checked access.
    fn index(&self, index: usize) -> &T {
        let len = self.len();
        self.get(index)
            .unwrap_or_else(|| panic!("index {index} out of bounds in deque of length {len}"))
    }
}

impl<T> IndexMut<usize> for SegmentedDeque<T> {
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        self.get_mut(index)
            .unwrap_or_else(|| panic!("index {index} out of bounds in deque of length {len}"))
    }
}

impl<T: fmt::Debug> fmt::Debug for SegmentedDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Clone> Clone for SegmentedDeque<T> {
    /// Deep-copies the elements into a freshly laid out deque.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.len());
        copy.extend(self.iter().cloned());
        copy
    }
}

impl<T> Extend<T> for SegmentedDeque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for SegmentedDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut deque = Self::with_capacity(iter.size_hint().0);
        deque.extend(iter);
        deque
    }
}

impl<T: PartialEq> PartialEq for SegmentedDeque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for SegmentedDeque<T> {}

impl<'d, T> IntoIterator for &'d SegmentedDeque<T> {
    type Item = &'d T;
    type IntoIter = Iter<'d, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'d, T> IntoIterator for &'d mut SegmentedDeque<T> {
    type Item = &'d mut T;
    type IntoIter = IterMut<'d, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> IntoIterator for SegmentedDeque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Consumes the deque, yielding its elements front to back.
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::fmt::Debug;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(SegmentedDeque<u32>: Send, Debug, Default);

    #[test]
    fn smoke_test() {
        let mut deque = SegmentedDeque::new();

        for value in 1..=10 {
            deque.push_back(value);
        }
        deque.push_front(0);

        assert_eq!(deque.len(), 11);
        assert_eq!(deque.front(), Some(&0));
        assert_eq!(deque.back(), Some(&10));
        assert_eq!(deque[4], 4);
        assert_eq!(deque[5], 5);

        assert_eq!(deque.pop_front(), Some(0));
        assert_eq!(deque.pop_back(), Some(10));
        assert_eq!(deque.len(), 9);
    }

    #[test]
    fn alternating_pushes_index_correctly() {
        // Pushing alternately to both ends, then reading by index, must see
        // the logical order - front pushes in reverse, back pushes in order.
        let mut deque = SegmentedDeque::new();
        let mut model = VecDeque::new();

        for value in 0..10_000_u32 {
            if value % 2 == 0 {
                deque.push_back(value);
                model.push_back(value);
            } else {
                deque.push_front(value);
                model.push_front(value);
            }
        }

        assert_eq!(deque.len(), model.len());
        for index in 0..model.len() {
            assert_eq!(deque[index], model[index], "mismatch at index {index}");
        }
    }

    #[test]
    fn buffers_are_released_on_pop() {
        let mut deque = SegmentedDeque::new();

        // u32 buffers hold 1024 elements; 10k elements span ~10 buffers.
        for value in 0..10_000_u32 {
            deque.push_back(value);
        }
        let peak = deque.buffer_count();
        assert!(peak >= 10, "expected ~10 buffers, found {peak}");

        while deque.pop_back().is_some() {}

        // Draining released every buffer except the resident one.
        assert_eq!(deque.buffer_count(), 1);

        // Refilling reuses the pool's freed blocks; no new chunks.
        let chunks = deque.pool().chunk_count();
        for value in 0..10_000_u32 {
            deque.push_back(value);
        }
        assert_eq!(deque.pool().chunk_count(), chunks);
    }

    #[test]
    fn draining_from_the_front_also_releases_buffers() {
        let mut deque = SegmentedDeque::new();

        for value in 0..5_000_u32 {
            deque.push_back(value);
        }

        while deque.pop_front().is_some() {}
        assert_eq!(deque.buffer_count(), 1);
        assert!(deque.is_empty());
    }

    #[test]
    fn sustained_front_growth_recenters_the_map() {
        let mut deque = SegmentedDeque::new();
        let initial_slots = deque.map_slot_count();
        assert_eq!(initial_slots, 8);

        // u64 buffers hold 512 elements; tens of thousands of front pushes
        // must outgrow the initial map's front slack several times over.
        for value in 0..50_000_u64 {
            deque.push_front(value);
        }

        assert!(deque.map_slot_count() > initial_slots);
        assert_eq!(deque.len(), 50_000);

        // Front pushes land in reverse order.
        for index in 0..50_000 {
            assert_eq!(deque[index], 49_999 - index as u64);
        }
    }

    #[test]
    fn mid_insert_and_remove_match_a_model() {
        let mut rng = StdRng::seed_from_u64(0xdeca);
        let mut deque = SegmentedDeque::new();
        let mut model: VecDeque<u32> = VecDeque::new();

        for step in 0..4_000_u32 {
            match rng.random_range(0..6) {
                0 => {
                    deque.push_front(step);
                    model.push_front(step);
                }
                1 => {
                    deque.push_back(step);
                    model.push_back(step);
                }
                2 => {
                    assert_eq!(deque.pop_front(), model.pop_front());
                }
                3 => {
                    assert_eq!(deque.pop_back(), model.pop_back());
                }
                4 => {
                    let at = rng.random_range(0..=model.len());
                    deque.insert(at, step);
                    model.insert(at, step);
                }
                _ => {
                    if !model.is_empty() {
                        let at = rng.random_range(0..model.len());
                        assert_eq!(deque.remove(at), model.remove(at).unwrap());
                    }
                }
            }

            assert_eq!(deque.len(), model.len());
        }

        assert!(deque.iter().eq(model.iter()));
    }

    #[test]
    fn insert_at_the_ends_degrades_to_push() {
        let mut deque: SegmentedDeque<i32> = (0..10).collect();

        deque.insert(0, -1);
        deque.insert(deque.len(), 99);

        assert_eq!(deque.front(), Some(&-1));
        assert_eq!(deque.back(), Some(&99));
        assert_eq!(deque.len(), 12);
    }

    #[test]
    fn clear_keeps_exactly_one_buffer() {
        let mut deque = SegmentedDeque::new();
        for value in 0..10_000_u32 {
            deque.push_back(value);
        }
        assert!(deque.buffer_count() > 1);

        deque.clear();

        assert!(deque.is_empty());
        assert_eq!(deque.buffer_count(), 1);

        // The kept buffer serves the next back pushes without allocation.
        let live = deque.pool().live_block_count();
        deque.push_back(1);
        deque.push_back(2);
        assert_eq!(deque.pool().live_block_count(), live);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn with_capacity_preallocates_and_shrink_reclaims() {
        let mut deque = SegmentedDeque::<u32>::with_capacity(5_000);

        // 5000 u32 elements need 5 buffers (1024 each), plus the cursor's.
        let reserved = deque.buffer_count();
        assert!(reserved >= 5, "expected >= 5 buffers, found {reserved}");

        // No allocations while filling into the reservation.
        let live = deque.pool().live_block_count();
        for value in 0..5_000 {
            deque.push_back(value);
        }
        assert_eq!(deque.pool().live_block_count(), live);

        deque.clear();
        deque.shrink_to_fit();
        assert_eq!(deque.buffer_count(), 1);
    }

    #[test]
    fn large_elements_get_small_buffers() {
        // 256-byte elements switch the layout to 16 elements per buffer.
        #[derive(Clone)]
        struct Big([u8; 256]);

        let mut deque = SegmentedDeque::new();
        for i in 0..100_u8 {
            deque.push_back(Big([i; 256]));
        }

        assert_eq!(deque.len(), 100);
        assert!(deque.buffer_count() >= 100 / 16);
        assert_eq!(deque[17].0[0], 17);
    }

    #[test]
    fn elements_are_dropped() {
        struct Tracked(Rc<Cell<usize>>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));

        let mut deque = SegmentedDeque::new();
        for _ in 0..100 {
            deque.push_back(Tracked(Rc::clone(&drops)));
        }

        drop(deque.pop_front());
        assert_eq!(drops.get(), 1);

        deque.clear();
        assert_eq!(drops.get(), 100);

        for _ in 0..10 {
            deque.push_back(Tracked(Rc::clone(&drops)));
        }
        drop(deque);
        assert_eq!(drops.get(), 110);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut deque: SegmentedDeque<u32> = (0..5).collect();

        deque.resize(8, 7);
        assert_eq!(
            deque.iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 7, 7, 7]
        );

        deque.resize(3, 0);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn clone_and_eq() {
        let deque: SegmentedDeque<u32> = (0..3_000).collect();
        let copy = deque.clone();

        assert_eq!(deque, copy);

        let mut different = copy.clone();
        drop(different.pop_back());
        assert_ne!(deque, different);
    }

    #[test]
    fn get_is_checked_and_index_panics() {
        let deque: SegmentedDeque<u32> = (0..3).collect();

        assert_eq!(deque.get(2), Some(&2));
        assert_eq!(deque.get(3), None);

        // SAFETY: 2 < len.
        assert_eq!(unsafe { deque.get_unchecked(2) }, &2);
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let deque: SegmentedDeque<u32> = (0..3).collect();
        _ = deque[3];
    }

    #[test]
    #[should_panic]
    fn insert_past_the_end_panics() {
        let mut deque: SegmentedDeque<u32> = (0..3).collect();
        deque.insert(4, 0);
    }

    #[test]
    #[should_panic]
    fn zero_sized_elements_panic() {
        drop(SegmentedDeque::<()>::new());
    }

    #[test]
    fn empty_deque_behaves() {
        let mut deque = SegmentedDeque::<u32>::new();

        assert!(deque.is_empty());
        assert_eq!(deque.front(), None);
        assert_eq!(deque.back(), None);
        assert_eq!(deque.pop_front(), None);
        assert_eq!(deque.pop_back(), None);
        assert_eq!(deque.buffer_count(), 1);
    }

    #[test]
    fn front_and_back_mutation() {
        let mut deque: SegmentedDeque<u32> = (0..5).collect();

        *deque.front_mut().unwrap() = 100;
        *deque.back_mut().unwrap() = 200;
        deque[2] = 50;

        assert_eq!(
            deque.iter().copied().collect::<Vec<_>>(),
            vec![100, 1, 50, 3, 200]
        );
    }
}
