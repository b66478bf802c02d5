use num_integer::Integer;

/// A position inside the two-level structure: which map slot, and which
/// element within that slot's buffer.
///
/// Cursors are plain values; all movement is div/mod arithmetic against the
/// fixed buffer capacity, never stepping, so jumping any distance is O(1)
/// and buffer boundaries need no special casing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Cursor {
    /// Index of the buffer in the pointer map.
    pub(crate) slot: usize,

    /// Index of the element within the buffer, `0..capacity`.
    pub(crate) offset: usize,
}

impl Cursor {
    #[must_use]
    pub(crate) fn new(slot: usize, offset: usize) -> Self {
        Self { slot, offset }
    }

    /// The cursor's position on the map's flat element grid.
    #[must_use]
    pub(crate) fn linear(self, capacity: usize) -> usize {
        // Cannot overflow: the grid is bounded by the map allocation, which
        // fits in memory.
        self.slot.wrapping_mul(capacity).wrapping_add(self.offset)
    }

    /// The cursor at the given flat grid position.
    #[must_use]
    pub(crate) fn from_linear(linear: usize, capacity: usize) -> Self {
        let (slot, offset) = linear.div_rem(&capacity);
        Self { slot, offset }
    }

    /// The cursor `n` elements later, crossing buffer boundaries as needed.
    #[must_use]
    pub(crate) fn advanced(self, n: usize, capacity: usize) -> Self {
        Self::from_linear(self.linear(capacity).wrapping_add(n), capacity)
    }

    /// The cursor `n` elements earlier.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the move would go before the grid's start.
    #[must_use]
    pub(crate) fn retreated(self, n: usize, capacity: usize) -> Self {
        let linear = self.linear(capacity);
        debug_assert!(n <= linear, "cursor retreat {n} underflows position {linear}");
        Self::from_linear(linear.wrapping_sub(n), capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_round_trips() {
        let cursor = Cursor::new(3, 5);
        assert_eq!(cursor.linear(8), 29);
        assert_eq!(Cursor::from_linear(29, 8), cursor);
    }

    #[test]
    fn advance_crosses_buffer_boundaries() {
        let cursor = Cursor::new(2, 6);
        assert_eq!(cursor.advanced(1, 8), Cursor::new(2, 7));
        assert_eq!(cursor.advanced(2, 8), Cursor::new(3, 0));
        assert_eq!(cursor.advanced(17, 8), Cursor::new(4, 7));
    }

    #[test]
    fn retreat_crosses_buffer_boundaries() {
        let cursor = Cursor::new(2, 0);
        assert_eq!(cursor.retreated(1, 8), Cursor::new(1, 7));
        assert_eq!(cursor.retreated(8, 8), Cursor::new(1, 0));
        assert_eq!(cursor.retreated(9, 8), Cursor::new(0, 7));
    }
}
