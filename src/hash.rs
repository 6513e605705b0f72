//! Hashing and equality interfaces.
//!
//! The container never touches key bytes itself: it consumes one 64-bit
//! word per key through [`WordHasher`] and treats that word as its only
//! source of randomness. Both levels of the table are slices of the same
//! word, so the quality of the supplied hash decides whether construction
//! succeeds.
//!
//! [`GenericHasher`] is the batteries-included implementation for types
//! that describe themselves through [`PortableHash`]. Custom hashers plug
//! in at the same seam; [`KeyEq`] does the same for equality, so lookups
//! can be instrumented or redefined without touching the key type.

use core::hash::Hasher;

/// External hash function interface.
///
/// # Requirements
///
/// - Pure and deterministic: a key always produces the same word.
/// - All 64 output bits should be meaningful. The primary bucket is taken
///   from the upper bits and secondary slices from arbitrary positions, so
///   weakly mixed regions of the word directly hurt construction.
/// - Consistent with the paired [`KeyEq`]: equal keys must produce equal
///   words. Unequal keys mapping to one word are a defect of the pairing
///   and are reported as [`HashCollision`](crate::BuildError::HashCollision)
///   during construction rather than tolerated.
/// - If `T: Borrow<U>` and a hasher serves both `T` and `U`, a value and
///   its borrowed form must produce the same word.
pub trait WordHasher<T: ?Sized> {
    /// Hash a key to a full machine word.
    fn hash_word(&self, key: &T) -> u64;
}

/// Equality predicate interface.
///
/// Must be an equivalence relation consistent with the paired
/// [`WordHasher`]: keys that compare equal hash to equal words.
/// Implementations may carry state; the container holds the predicate by
/// value.
pub trait KeyEq<T: ?Sized> {
    /// Whether `a` and `b` are the same key.
    fn eq(&self, a: &T, b: &T) -> bool;
}

/// [`KeyEq`] through the type's own [`Eq`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NaturalEq;

impl<T: ?Sized + Eq> KeyEq<T> for NaturalEq {
    #[inline]
    fn eq(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Generic hasher for [`PortableHash`] types, backed by rapidhash.
///
/// The seed is fixed at construction and never changes afterwards, keeping
/// rebuilds reproducible. A build that fails with
/// [`HashCollision`](crate::BuildError::HashCollision) or
/// [`ConstructionFailure`](crate::BuildError::ConstructionFailure) can be
/// retried with [`with_seed`](GenericHasher::with_seed) and a different
/// seed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericHasher {
    seed: u64,
}

impl GenericHasher {
    /// Construct a hasher with an explicit seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for GenericHasher {
    #[inline]
    fn default() -> Self {
        // Hexadecimal digits of pi - 3
        Self::with_seed(0x243f_6a88_85a3_08d3)
    }
}

impl<T: ?Sized + PortableHash> WordHasher<T> for GenericHasher {
    #[inline]
    fn hash_word(&self, key: &T) -> u64 {
        let mut state = rapidhash::RapidHasher::new(self.seed);
        key.hash(&mut state);
        state.finish()
    }
}

/// Portable alternative to [`Hash`](core::hash::Hash).
///
/// # Requirements
///
/// - Much like with [`core::hash::Hash`], `Eq`-equal objects must imply
///   equal data passed to the hasher. If `T: Borrow<U>` and both `T` and
///   `U` implement [`PortableHash`], the data written when hashing a value
///   and its borrowed counterpart must match; the implementation for
///   [`String`](alloc::string::String) forwards to the one for [`str`].
///
/// - Unlike [`core::hash::Hash`], the written data must be portable
///   between platforms. Directly writing `usize` into the hasher is a bad
///   idea because of possible differences in pointer size.
///
/// - When hashing two objects that compare unequal, the sequences of
///   `write_*` calls must differ, and the byte string written by one
///   object must not be a prefix of the byte string written by another.
pub trait PortableHash {
    /// Write a value into the hasher.
    fn hash<H: Hasher>(&self, state: &mut H);

    /// Write a slice of values into the hasher.
    ///
    /// Semantically equivalent to hashing each element one by one. This
    /// method does not write the length of the slice, so hashing a
    /// variable-length collection needs to be led by writing its length.
    #[inline]
    fn hash_slice<H: Hasher>(data: &[Self], state: &mut H)
    where
        Self: Sized,
    {
        for piece in data {
            piece.hash(state);
        }
    }
}

impl<T: ?Sized + PortableHash> PortableHash for &T {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<T: ?Sized + PortableHash> PortableHash for &mut T {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

/// Implement [`PortableHash`] for fixed-width integers by calling into
/// [`Hasher`].
macro_rules! impl_primitive {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl PortableHash for $ty {
                #[inline]
                fn hash<H: Hasher>(&self, state: &mut H) {
                    state.$method(*self);
                }
            }
        )*
    };
}
impl_primitive! {
    u8 => write_u8,
    u16 => write_u16,
    u32 => write_u32,
    u64 => write_u64,
    u128 => write_u128,
    i8 => write_i8,
    i16 => write_i16,
    i32 => write_i32,
    i64 => write_i64,
    i128 => write_i128,
}

impl PortableHash for usize {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(*self as u64);
    }
}

impl PortableHash for isize {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(*self as i64);
    }
}

impl PortableHash for bool {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(u8::from(*self));
    }
}

impl PortableHash for char {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(*self as u32);
    }
}

// Floats don't implement `Eq`, so they don't get `PortableHash` either.

/// Implement [`PortableHash`] for types that represent UTF-8 strings.
///
/// The 0xff terminator cannot occur inside UTF-8 data, which keeps the
/// written byte strings prefix-free.
macro_rules! impl_str {
    ($ty:ty) => {
        impl PortableHash for $ty {
            #[inline]
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write(self.as_bytes());
                state.write(&[0xff]);
            }
        }
    };
}
impl_str!(str);
impl_str!(alloc::string::String);

impl<T: PortableHash> PortableHash for [T] {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.len() as u64);
        T::hash_slice(self, state);
    }
}

impl<T: PortableHash> PortableHash for alloc::vec::Vec<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        <[T] as PortableHash>::hash(self, state);
    }
}
