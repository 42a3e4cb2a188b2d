use std::sync::Mutex;

use merkle_hash::Digest;

use crate::error::{InvalidChallenge, TreeError};

/// An append-only log of leaf hashes. A `LeafLog` owns the entries and
/// their digests; it does not know about tree structure, ranges that
/// span more than one entry, or caching — those live in the range
/// engine, one layer up.
///
/// Implementations MUST linearize `append` so that indices are assigned
/// monotonically, and MUST NOT reorder or mutate entries once assigned
/// (I1 in the data model: the hash at index `i` never changes).
pub trait LeafLog: Send + Sync {
    /// Persists `entry` together with its precomputed leaf hash and
    /// returns the 1-based index it was assigned.
    fn append(&self, entry: &[u8], hash: Digest) -> Result<u64, TreeError>;

    /// Returns the leaf hash at 1-based `index`.
    fn get_leaf(&self, index: u64) -> Result<Digest, TreeError>;

    /// Returns, in order, `width` leaf hashes starting at 0-based `offset`.
    fn get_range(&self, offset: u64, width: u64) -> Result<Vec<Digest>, TreeError>;

    /// The number of entries appended so far.
    fn size(&self) -> u64;
}

/// A `LeafLog` backed by an in-process vector. Intended for tests and
/// small trees; durable deployments should implement `LeafLog` against
/// the SQL schema documented for this crate.
#[derive(Default)]
pub struct InMemoryLog {
    entries: Mutex<Vec<(Vec<u8>, Digest)>>,
}

impl InMemoryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        InMemoryLog::default()
    }

    /// Returns the original entry bytes stored at 1-based `index`, for
    /// callers that need the raw payload rather than its hash.
    pub fn get_entry(&self, index: u64) -> Result<Vec<u8>, TreeError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let size = entries.len() as u64;
        if index == 0 || index > size {
            return Err(InvalidChallenge::IndexOutOfRange { index, size }.into());
        }
        Ok(entries[(index - 1) as usize].0.clone())
    }
}

impl LeafLog for InMemoryLog {
    fn append(&self, entry: &[u8], hash: Digest) -> Result<u64, TreeError> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push((entry.to_vec(), hash));
        Ok(entries.len() as u64)
    }

    fn get_leaf(&self, index: u64) -> Result<Digest, TreeError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let size = entries.len() as u64;
        if index == 0 || index > size {
            return Err(InvalidChallenge::IndexOutOfRange { index, size }.into());
        }
        Ok(entries[(index - 1) as usize].1.clone())
    }

    fn get_range(&self, offset: u64, width: u64) -> Result<Vec<Digest>, TreeError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let size = entries.len() as u64;
        if offset + width > size {
            return Err(InvalidChallenge::SizeExceedsCurrent {
                requested: offset + width,
                current: size,
            }
            .into());
        }
        Ok(entries[offset as usize..(offset + width) as usize]
            .iter()
            .map(|(_, h)| h.clone())
            .collect())
    }

    fn size(&self) -> u64 {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len() as u64
    }
}
