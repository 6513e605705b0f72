//! Untyped build core.
//!
//! Construction works over pre-hashed 64-bit words; resolving a word back
//! to its key (needed only for duplicate diagnostics) goes through a
//! caller-provided equality oracle, so this module never sees the key type.
//!
//! The scheme is two-level: keys are partitioned into primary buckets by
//! the upper bits of their hash words, then each bucket searches for a
//! `(shift, width)` slice of the word that is injective over its keys and
//! a `base` offset placing those slices onto free slots of the shared
//! element array. Buckets are handled largest first so that the hardest
//! placements see the emptiest array.

use alloc::{vec, vec::Vec};
use core::cmp::Reverse;

use crate::bitmap::BitMap;
use crate::error::BuildError;
use crate::jump::JumpRecord;
use crate::policy;

/// Widths beyond this are never tried. A pragmatic cap: slices wider than
/// the element array can address contribute nothing but scan time.
const MAX_WIDTH: u32 = 56;

/// Chain terminator in the bucket arena.
const NIL: u32 = u32::MAX;

/// Arena node: one input key threaded into a primary bucket chain.
struct Node {
    /// Input position of the key.
    key: u32,
    /// Next node in the chain, or [`NIL`].
    next: u32,
}

/// Everything the container persists from a successful build.
#[derive(Debug)]
pub(crate) struct BuildOutput {
    pub(crate) size_index: u32,
    pub(crate) jumps: alloc::boxed::Box<[JumpRecord]>,
    /// Slot assigned to each input key, by input position.
    pub(crate) positions: Vec<usize>,
}

/// Outcome of trying one `(shift, width)` pair on a bucket.
enum Placement {
    /// The bucket's keys land on distinct free slots starting at this base.
    Placed(usize),
    /// The slice is not injective over the bucket; try the next pair.
    ParametersUnusable,
    /// The slice is injective but fits nowhere in the free slots.
    NoSpaceForParameters,
}

/// Per-attempt failure, folded into [`BuildError`] by [`build`].
enum AttemptError {
    DuplicateKey,
    HashCollision,
    Infeasible,
}

/// Compute jump records and slot assignments for `hashes`.
///
/// `keys_equal` compares the input keys at two positions; it is consulted
/// only when two hash words collide. `lambda` is the target average bucket
/// size: every infeasible attempt halves it, buying easier placement with
/// a larger jump array, until an attempt succeeds or `lambda` reaches zero.
///
/// Duplicate keys and hash collisions abort immediately; no bucket count
/// can separate two keys that share a hash word.
pub(crate) fn build(
    hashes: &[u64],
    mut keys_equal: impl FnMut(usize, usize) -> bool,
    mut lambda: usize,
) -> Result<BuildOutput, BuildError> {
    assert!(hashes.len() < (1 << 31), "too many keys");

    while lambda > 0 {
        match attempt(hashes, &mut keys_equal, lambda) {
            Ok(output) => return Ok(output),
            Err(AttemptError::DuplicateKey) => return Err(BuildError::DuplicateKey),
            Err(AttemptError::HashCollision) => return Err(BuildError::HashCollision),
            Err(AttemptError::Infeasible) => lambda /= 2,
        }
    }
    Err(BuildError::ConstructionFailure)
}

/// One construction attempt at a fixed load parameter.
fn attempt(
    hashes: &[u64],
    keys_equal: &mut impl FnMut(usize, usize) -> bool,
    lambda: usize,
) -> Result<BuildOutput, AttemptError> {
    let n = hashes.len();
    let size_index = policy::size_index(n.div_ceil(lambda));
    let bucket_count = policy::table_size(size_index);

    // Primary bucketing. Nodes live in one arena sized to the key count and
    // chain through integer indices. Walking the chain before prepending
    // doubles as duplicate detection: equal words always share a bucket.
    let mut heads = vec![NIL; bucket_count];
    let mut sizes = vec![0u32; bucket_count];
    let mut nodes: Vec<Node> = Vec::with_capacity(n);
    for (index, &hash) in hashes.iter().enumerate() {
        let bucket = policy::primary_index(hash, size_index);
        let mut cursor = heads[bucket];
        while cursor != NIL {
            let node = &nodes[cursor as usize];
            if hashes[node.key as usize] == hash {
                return Err(if keys_equal(node.key as usize, index) {
                    AttemptError::DuplicateKey
                } else {
                    AttemptError::HashCollision
                });
            }
            cursor = node.next;
        }
        nodes.push(Node {
            key: index as u32,
            next: heads[bucket],
        });
        heads[bucket] = nodes.len() as u32 - 1;
        sizes[bucket] += 1;
    }

    // Hardest buckets first: a large bucket constrains both the slice
    // choice and the free-slot layout, so it gets the emptiest array.
    // Ties resolve by bucket index to keep the build deterministic.
    let mut order: Vec<u32> = (0..bucket_count as u32).collect();
    order.sort_unstable_by_key(|&bucket| (Reverse(sizes[bucket as usize]), bucket));

    let mut free = BitMap::new_ones(n);
    let mut jumps = vec![JumpRecord::EMPTY; bucket_count];
    let mut positions = vec![0usize; n];
    let mut bucket_keys: Vec<(u32, u64)> = Vec::new();
    let mut offsets: Vec<u64> = Vec::new();

    for &bucket in &order {
        let size = sizes[bucket as usize];
        if size == 0 {
            break; // remaining buckets are empty too
        }

        bucket_keys.clear();
        let mut cursor = heads[bucket as usize];
        while cursor != NIL {
            let node = &nodes[cursor as usize];
            bucket_keys.push((node.key, hashes[node.key as usize]));
            cursor = node.next;
        }

        // A slice narrower than ceil(log2(size)) bits cannot be injective,
        // so the width scan starts there.
        let max_offset = u64::from(size).next_power_of_two() - 1;
        let min_width = max_offset.count_ones();

        let mut placed = false;
        'search: for shift in 0..u64::BITS - min_width {
            for width in min_width..MAX_WIDTH {
                match try_place(&bucket_keys, shift, width, n, &free, &mut offsets) {
                    Placement::Placed(base) => {
                        for (&(key, _), &offset) in bucket_keys.iter().zip(&offsets) {
                            let slot = base + offset as usize;
                            free.claim(slot);
                            positions[key as usize] = slot;
                        }
                        jumps[bucket as usize] = JumpRecord::new(base, shift, width);
                        placed = true;
                        break 'search;
                    }
                    Placement::ParametersUnusable => {}
                    // An injective slice that fits nowhere: wider slices
                    // only spread further, so hand the bucket to the retry
                    // loop instead of scanning on.
                    Placement::NoSpaceForParameters => break 'search,
                }
            }
        }
        if !placed {
            return Err(AttemptError::Infeasible);
        }
    }

    Ok(BuildOutput {
        size_index,
        jumps: jumps.into_boxed_slice(),
        positions,
    })
}

/// Try one `(shift, width)` pair on a bucket.
///
/// On success `offsets` holds the bucket's slice values aligned with the
/// caller's key order.
fn try_place(
    bucket_keys: &[(u32, u64)],
    shift: u32,
    width: u32,
    capacity: usize,
    free: &BitMap,
    offsets: &mut Vec<u64>,
) -> Placement {
    let mask = (1u64 << width) - 1;
    offsets.clear();
    for &(_, hash) in bucket_keys {
        let offset = (hash >> shift) & mask;
        // Buckets hold a handful of keys at practical loads; a linear
        // membership probe beats anything with setup costs.
        if offsets.contains(&offset) {
            return Placement::ParametersUnusable;
        }
        offsets.push(offset);
    }

    // Scanning bases from zero packs finished buckets toward the front of
    // the array, preserving a contiguous free tail for the rest.
    for base in 0..capacity {
        let fits = offsets.iter().all(|&offset| {
            let slot = base + offset as usize;
            slot < capacity && free.is_free(slot)
        });
        if fits {
            return Placement::Placed(base);
        }
    }
    Placement::NoSpaceForParameters
}
