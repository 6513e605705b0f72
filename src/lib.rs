//! Static perfect-hash sets.
//!
//! [`PerfectSet`] is an immutable membership container built once from a
//! complete key set with the [FKS two-level scheme][fks]: keys are
//! partitioned into primary buckets by the upper bits of a 64-bit hash
//! word, and each bucket records a `(base, shift, width)` *jump* that maps
//! a slice of the same word onto its own stretch of a shared element
//! array. Every lookup therefore costs one hash computation, one
//! jump-table read, one element read and one equality comparison --
//! worst case, not amortized.
//!
//! [fks]: https://en.wikipedia.org/wiki/Static_hashing#FKS_Hashing
//!
//! The externally supplied hash function is the only source of randomness.
//! A layout attempt that fails is retried with more, smaller buckets;
//! inputs the hash cannot separate are reported as [`BuildError`]s rather
//! than looped on.
//!
//! # Usage
//!
//! ```
//! use fks::PerfectSet;
//!
//! let set: PerfectSet<&str> = PerfectSet::from_keys(vec!["alpha", "beta", "gamma"])?;
//! assert!(set.contains("beta"));
//! assert_eq!(set.find("delta"), None);
//! # Ok::<(), fks::BuildError>(())
//! ```
//!
//! Any type can be stored by implementing [`PortableHash`], or by plugging
//! a custom [`WordHasher`]/[`KeyEq`] pair into
//! [`PerfectSet::from_keys_with_hasher`].
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`PerfectSet`]. Deserialized
//!   data is validated before use, so feeding back a tampered table yields
//!   an error instead of a corrupt set.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod bitmap;
mod build;
mod error;
pub mod hash;
mod jump;
mod policy;
mod scatter;
mod set;

pub use error::BuildError;
pub use hash::{GenericHasher, KeyEq, NaturalEq, PortableHash, WordHasher};
pub use set::PerfectSet;

#[cfg(test)]
mod tests;
