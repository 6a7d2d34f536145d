//! Error types for tree operations.

use thiserror::Error;

use crate::Key;

/// Result type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by [`AvlTree`](crate::AvlTree) operations.
///
/// A failed operation leaves the tree unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("key {0} is already present")]
    DuplicateKey(Key),

    #[error("key {0} not found")]
    KeyNotFound(Key),
}
