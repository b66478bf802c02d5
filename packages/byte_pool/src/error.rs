use thiserror::Error;

/// Errors that can occur when requesting memory from a
/// [`BytePool`][crate::BytePool].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AllocError {
    /// The system allocator refused to provide a new arena chunk and no free
    /// block in any sufficiently large size class was available to repurpose
    /// as one.
    #[error(
        "out of memory: the system allocator failed to provide {requested} bytes and no free block was available to repurpose"
    )]
    OutOfMemory {
        /// Total bytes requested from the system allocator.
        requested: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`AllocError`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, AllocError>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AllocError: Send, Sync, Debug);

    #[test]
    fn out_of_memory_reports_requested_bytes() {
        let error = AllocError::OutOfMemory { requested: 8192 };

        assert!(error.to_string().contains("8192"));
    }
}
