//! Final element placement.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Move each `keys[i]` into slot `positions[i]` of the returned array.
///
/// `positions` must be a permutation of `0..keys.len()`; the build
/// guarantees this because every key claims exactly one free slot of an
/// array sized to the key count.
pub(crate) fn scatter<T>(keys: Vec<T>, positions: &[usize]) -> Box<[T]> {
    let mut placed: Vec<(usize, T)> = positions.iter().copied().zip(keys).collect();
    placed.sort_unstable_by_key(|&(slot, _)| slot);
    placed.into_iter().map(|(_, key)| key).collect()
}
