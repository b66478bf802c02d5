//! The size-class table.
//!
//! Every small request is rounded up to one of 56 class boundaries arranged
//! in six bands of increasing granularity:
//!
//! | sizes       | step | classes |
//! |-------------|------|---------|
//! | 1..=128     | 8    | 16      |
//! | 129..=256   | 16   | 8       |
//! | 257..=512   | 32   | 8       |
//! | 513..=1024  | 64   | 8       |
//! | 1025..=2048 | 128  | 8       |
//! | 2049..=4096 | 256  | 8       |
//!
//! One free list serves each class, so a freed block of any size within a
//! band is immediately reusable for every other size in the same class.

/// Largest allocation, in bytes, served from the free lists. Anything larger
/// is routed straight to the system allocator.
pub const SMALL_BLOCK_LIMIT: usize = 4096;

/// Number of size classes across all bands.
pub const CLASS_COUNT: usize = 56;

/// Alignment guaranteed by every free-list block.
///
/// Blocks are carved from the arena at multiples of the smallest class size,
/// so nothing stronger than this can be promised. Layouts that need more are
/// routed to the system allocator instead.
pub const BLOCK_ALIGN: usize = 8;

/// Step size of the band the given size falls into.
///
/// Sizes beyond the last band keep its step; this lets [`round_up`] accept
/// arbitrary sizes when computing arena growth slack.
pub(crate) fn granularity(size: usize) -> usize {
    if size <= 512 {
        if size <= 128 {
            8
        } else if size <= 256 {
            16
        } else {
            32
        }
    } else if size <= 1024 {
        64
    } else if size <= 2048 {
        128
    } else {
        256
    }
}

/// Rounds `size` up to its class boundary (or, beyond the small-object limit,
/// to the coarsest band's step).
pub fn round_up(size: usize) -> usize {
    let step = granularity(size);
    // Cannot overflow for any size this crate passes in: callers round either
    // sizes at most SMALL_BLOCK_LIMIT or arena byte counts far below
    // usize::MAX - 256.
    let bumped = size.wrapping_add(step.wrapping_sub(1));
    bumped & !step.wrapping_sub(1)
}

/// The free-list index serving `size`.
///
/// # Panics
///
/// Panics if `size` is zero or exceeds [`SMALL_BLOCK_LIMIT`].
pub(crate) fn class_of(size: usize) -> usize {
    assert!(
        size > 0 && size <= SMALL_BLOCK_LIMIT,
        "size {size} is outside the small-object range (1..={SMALL_BLOCK_LIMIT})"
    );

    let rounded = round_up(size);
    // Each band contributes `band width / step` classes; the offsets below
    // are the cumulative class counts of the preceding bands.
    if rounded <= 128 {
        (rounded / 8) - 1
    } else if rounded <= 256 {
        15 + (rounded - 128) / 16
    } else if rounded <= 512 {
        23 + (rounded - 256) / 32
    } else if rounded <= 1024 {
        31 + (rounded - 512) / 64
    } else if rounded <= 2048 {
        39 + (rounded - 1024) / 128
    } else {
        47 + (rounded - 2048) / 256
    }
}

/// The block size served by the given class index.
///
/// # Panics
///
/// Panics if `class` is not below [`CLASS_COUNT`].
pub(crate) fn block_size(class: usize) -> usize {
    assert!(
        class < CLASS_COUNT,
        "class index {class} out of range (0..{CLASS_COUNT})"
    );

    if class < 16 {
        (class + 1) * 8
    } else if class < 24 {
        128 + (class - 15) * 16
    } else if class < 32 {
        256 + (class - 23) * 32
    } else if class < 40 {
        512 + (class - 31) * 64
    } else if class < 48 {
        1024 + (class - 39) * 128
    } else {
        2048 + (class - 47) * 256
    }
}

/// The largest class whose block size fits within `size` bytes, if any.
///
/// Used when salvaging an arena remainder: the remainder is rarely an exact
/// class boundary, and registering it under the next class *up* would hand
/// out more bytes than exist. Rounding down wastes the sub-class tail but
/// keeps every free list honest.
pub(crate) fn class_fitting(size: usize) -> Option<usize> {
    if size < block_size(0) {
        return None;
    }

    let clamped = size.min(SMALL_BLOCK_LIMIT);
    let class = class_of(clamped);
    if block_size(class) <= clamped {
        Some(class)
    } else {
        // `clamped` is at least one full block, so the rounded-up class has a
        // smaller neighbor and that neighbor's block size fits.
        Some(class - 1)
    }
}
