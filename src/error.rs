//! Construction failures.

use displaydoc::Display;
use thiserror::Error;

/// Why a set could not be built.
///
/// All three kinds are raised synchronously by the constructors; lookup
/// never fails. [`DuplicateKey`](BuildError::DuplicateKey) is fixed by
/// deduplicating the input. The other two indict the hash function for
/// this input: retrying with a differently seeded or better-mixing hasher
/// is the only recourse, and construction never reseeds on its own.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// duplicate keys in the input
    DuplicateKey,

    /// two unequal keys hash to the same word
    HashCollision,

    /// no feasible table layout for this input
    ConstructionFailure,
}
