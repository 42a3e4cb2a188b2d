use std::fmt;

use thiserror::Error;

/// Raised when a caller-supplied index or size is out of bounds, or when
/// two sizes given together are mutually incompatible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidChallenge {
    /// `index` is not in `[1, size]`.
    #[error("index {index} is out of range [1, {size}]")]
    IndexOutOfRange {
        /// The offending 1-based index.
        index: u64,
        /// The tree size it was checked against.
        size: u64,
    },
    /// A requested size exceeds the tree's current size.
    #[error("requested size {requested} exceeds current tree size {current}")]
    SizeExceedsCurrent {
        /// The size requested by the caller.
        requested: u64,
        /// The tree's current size.
        current: u64,
    },
    /// `size1 > size2` in a consistency challenge.
    #[error("size1 ({size1}) must not exceed size2 ({size2})")]
    SizesOutOfOrder {
        /// The earlier size.
        size1: u64,
        /// The later size.
        size2: u64,
    },
}

/// Raised when a proof fails verification or is structurally malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidProof {
    /// `rule`/`subset`/`path` lengths disagree, or the algorithm named in
    /// the proof is not recognized.
    #[error("proof is structurally malformed: {0}")]
    Malformed(String),
    /// The reconstructed digest does not equal the target commitment.
    #[error("proof does not fold to the target commitment")]
    Mismatch,
}

/// Wraps a storage backend's error, propagated verbatim by the core.
#[derive(Debug)]
pub struct StorageError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl StorageError {
    /// Wraps a backend error for propagation across the storage boundary.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StorageError(Box::new(err))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage backend failed: {}", self.0)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// The error type returned by fallible tree operations.
#[derive(Error, Debug)]
pub enum TreeError {
    /// See [`InvalidChallenge`].
    #[error(transparent)]
    InvalidChallenge(#[from] InvalidChallenge),
    /// See [`StorageError`].
    #[error(transparent)]
    Storage(#[from] StorageError),
}
