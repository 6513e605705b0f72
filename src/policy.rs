//! Primary-table size policy.
//!
//! Table sizes are always powers of two and are represented by a *size
//! index*: the right-shift that turns a 64-bit hash word into a primary
//! bucket index using the upper hash bits. Secondary slices are taken from
//! arbitrary positions of the same word via per-bucket shifts, so the two
//! extractions overlap only when a bucket's search settles on high bits.

/// Positions and shifts assume a 64-bit address space throughout.
const _: () = assert!(usize::BITS == 64, "fks requires a 64-bit platform");

/// Bits in a hash word.
const WORD_BITS: u32 = u64::BITS;

/// Size index for a table of at least `max(n, 2)` buckets, rounded up to
/// a power of two.
pub(crate) fn size_index(n: usize) -> u32 {
    let exp = if n <= 2 {
        1
    } else {
        usize::BITS - (n - 1).leading_zeros()
    };
    WORD_BITS - exp
}

/// Bucket count encoded by a size index.
pub(crate) fn table_size(index: u32) -> usize {
    1 << (WORD_BITS - index)
}

/// Primary bucket of a hash word: its upper `64 - index` bits.
#[inline]
pub(crate) fn primary_index(hash: u64, index: u32) -> usize {
    (hash >> index) as usize
}
