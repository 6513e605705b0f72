//! The perfect-hash set.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;

use crate::build;
use crate::error::BuildError;
use crate::hash::{GenericHasher, KeyEq, NaturalEq, WordHasher};
use crate::jump::JumpRecord;
use crate::policy;
use crate::scatter::scatter;

/// An immutable set with worst-case O(1) membership tests.
///
/// Built once from a complete key set; supports nothing but lookup and
/// iteration afterwards. A successful build guarantees the lookup shape:
/// one hash computation, one jump-table read, one element read and one
/// final equality comparison, with no probing loop. Concurrent readers
/// need no synchronization.
///
/// `H` supplies 64-bit hash words and `E` the equality relation; both are
/// held by value and may carry state. The defaults serve any
/// `T: PortableHash + Eq`.
///
/// # Example
///
/// ```
/// use fks::PerfectSet;
///
/// let primes: PerfectSet<u32> = PerfectSet::from_keys(vec![2, 3, 5, 7, 11])?;
/// assert!(primes.contains(&5));
/// assert!(!primes.contains(&6));
/// # Ok::<(), fks::BuildError>(())
/// ```
pub struct PerfectSet<T, H = GenericHasher, E = NaturalEq> {
    inner: SetInner<T, H, E>,
}

/// The actual set.
///
/// Kept separate from [`PerfectSet`] so that deserialized data passes
/// through `TryFrom` validation before anything trusts it.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct SetInner<T, H, E> {
    hasher: H,
    eq: E,
    /// Right-shift mapping a hash word to a primary bucket index.
    size_index: u32,
    /// One record per primary bucket.
    jumps: Box<[JumpRecord]>,
    /// Keys, indexed by their assigned slots; exactly one slot per key.
    elements: Box<[T]>,
}

impl<T, H, E> PerfectSet<T, H, E>
where
    H: WordHasher<T> + Default,
    E: KeyEq<T> + Default,
{
    /// Build a set from `keys` with the default hasher, equality and load
    /// parameter.
    ///
    /// # Errors
    ///
    /// See [`from_keys_with_hasher`](Self::from_keys_with_hasher).
    pub fn from_keys(keys: Vec<T>) -> Result<Self, BuildError> {
        Self::from_keys_with_hasher(keys, H::default(), E::default(), Self::DEFAULT_LAMBDA)
    }

    /// Build a set from `keys` with an explicit load parameter.
    ///
    /// # Errors
    ///
    /// See [`from_keys_with_hasher`](Self::from_keys_with_hasher).
    pub fn from_keys_with_lambda(keys: Vec<T>, lambda: usize) -> Result<Self, BuildError> {
        Self::from_keys_with_hasher(keys, H::default(), E::default(), lambda)
    }
}

impl<T, H, E> PerfectSet<T, H, E> {
    /// Target average primary-bucket size used by
    /// [`from_keys`](Self::from_keys).
    pub const DEFAULT_LAMBDA: usize = 4;

    /// Build a set from `keys` with an explicit hasher, equality predicate
    /// and load parameter.
    ///
    /// `lambda` is the target average primary-bucket size. Whenever a
    /// layout attempt fails it is halved, buying easier placement with a
    /// larger jump array, until an attempt succeeds or `lambda` reaches
    /// zero. Passing `lambda = 0` therefore fails immediately.
    ///
    /// # Errors
    ///
    /// - [`BuildError::DuplicateKey`] if two input keys compare equal.
    /// - [`BuildError::HashCollision`] if two unequal keys hash to the
    ///   same word.
    /// - [`BuildError::ConstructionFailure`] if every load-parameter retry
    ///   fails to place some bucket.
    ///
    /// # Panics
    ///
    /// Panics if `keys` holds 2^31 or more entries.
    pub fn from_keys_with_hasher(
        keys: Vec<T>,
        hasher: H,
        eq: E,
        lambda: usize,
    ) -> Result<Self, BuildError>
    where
        H: WordHasher<T>,
        E: KeyEq<T>,
    {
        let hashes: Vec<u64> = keys.iter().map(|key| hasher.hash_word(key)).collect();
        let output = build::build(&hashes, |a, b| eq.eq(&keys[a], &keys[b]), lambda)?;
        Ok(Self {
            inner: SetInner {
                hasher,
                eq,
                size_index: output.size_index,
                jumps: output.jumps,
                elements: scatter(keys, &output.positions),
            },
        })
    }

    /// Look up a key, returning a reference to the stored element.
    ///
    /// Accepts any borrowed form of the element type, provided the hasher
    /// and the equality predicate see through it consistently (a
    /// `PerfectSet<String>` answers `&str` queries). Lookup never fails;
    /// absent keys return `None`.
    #[inline]
    pub fn find<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: WordHasher<Q>,
        E: KeyEq<Q>,
    {
        let hash = self.inner.hasher.hash_word(key);
        let bucket = policy::primary_index(hash, self.inner.size_index);
        // SAFETY: `primary_index` keeps the upper `64 - size_index` bits of
        // the hash, so `bucket < table_size(size_index)`, and the jump
        // array holds exactly `table_size(size_index)` records.
        let jump = unsafe { self.inner.jumps.get_unchecked(bucket) };
        // Positions past the element array arise only for absent keys; the
        // failed bounds check is their miss path.
        self.inner
            .elements
            .get(jump.position(hash))
            .filter(|stored| self.inner.eq.eq((*stored).borrow(), key))
    }

    /// Whether the set contains a key.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: WordHasher<Q>,
        E: KeyEq<Q>,
    {
        self.find(key).is_some()
    }

    /// Number of stored keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.elements.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.elements.is_empty()
    }

    /// Iterate over the stored keys in storage order.
    ///
    /// The order is an artifact of bucket placement, not of insertion; it
    /// is deterministic for a given input sequence, hasher and load
    /// parameter.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.inner.elements.iter()
    }
}

impl<T: Clone, H: Clone, E: Clone> Clone for PerfectSet<T, H, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug, H, E> fmt::Debug for PerfectSet<T, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, H, E> IntoIterator for &'a PerfectSet<T, H, E> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Scope for `serde`-related code.
#[cfg(feature = "serde")]
mod serde_support {
    use super::{KeyEq, PerfectSet, SetInner, WordHasher};
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// size index out of range
        BadSizeIndex,

        /// wrong jump record count
        WrongJumpCount,

        /// jump parameters exceed the hash width
        OversizedJump,

        /// jump base overflows the address space
        OverflowingJumpBase,

        /// misplaced element
        MisplacedElement,
    }

    impl<T, H: WordHasher<T>, E: KeyEq<T>> TryFrom<SetInner<T, H, E>> for PerfectSet<T, H, E> {
        type Error = Error;

        fn try_from(inner: SetInner<T, H, E>) -> Result<Self, Error> {
            if !(1..=63).contains(&inner.size_index) {
                return Err(Error::BadSizeIndex);
            }

            if inner.jumps.len() != crate::policy::table_size(inner.size_index) {
                return Err(Error::WrongJumpCount);
            }

            if inner
                .jumps
                .iter()
                .any(|jump| jump.shift >= 64 || jump.width >= 64)
            {
                return Err(Error::OversizedJump);
            }

            // The widths are in range at this point, so the largest offset
            // a record can extract is `(1 << width) - 1`; the base must
            // leave room for it.
            if inner
                .jumps
                .iter()
                .any(|jump| jump.base > usize::MAX - ((1usize << jump.width) - 1))
            {
                return Err(Error::OverflowingJumpBase);
            }

            for (slot, element) in inner.elements.iter().enumerate() {
                let hash = inner.hasher.hash_word(element);
                let jump = &inner.jumps[crate::policy::primary_index(hash, inner.size_index)];
                if jump.position(hash) != slot {
                    return Err(Error::MisplacedElement);
                }
            }

            Ok(Self { inner })
        }
    }

    impl<T, H, E> serde::Serialize for PerfectSet<T, H, E>
    where
        T: serde::Serialize,
        H: serde::Serialize,
        E: serde::Serialize,
    {
        #[inline]
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.inner.serialize(serializer)
        }
    }

    impl<'de, T, H, E> serde::Deserialize<'de> for PerfectSet<T, H, E>
    where
        T: serde::Deserialize<'de>,
        H: serde::Deserialize<'de> + WordHasher<T>,
        E: serde::Deserialize<'de> + KeyEq<T>,
    {
        #[inline]
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let inner = SetInner::<T, H, E>::deserialize(deserializer)?;
            Self::try_from(inner).map_err(serde::de::Error::custom)
        }
    }
}
