use merkle_hash::{Digest, HashAlgorithm, Hasher, UnsupportedAlgorithm};

use crate::{
    cache::{CacheStats, SubrootCache},
    consistency::{prove_consistency, prove_consistency_naive},
    error::{InvalidChallenge, TreeError},
    inclusion::{prove_inclusion, prove_inclusion_naive},
    proof::Proof,
    range::{get_root, get_root_naive},
    storage::LeafLog,
};

/// Minimum subtree width admitted to the subroot cache. See [`TreeConfig`].
pub const DEFAULT_THRESHOLD: u64 = 128;
/// Default subroot cache byte capacity: 1 GiB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 1 << 30;

/// Construction-time configuration for a [`MerkleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// The hash algorithm the tree hashes leaves and pairs with.
    pub algorithm: HashAlgorithm,
    /// Whether domain-separation prefixes are applied (see `merkle-hash`).
    pub security: bool,
    /// Minimum subtree width admitted to the subroot cache.
    pub threshold: u64,
    /// Subroot cache byte capacity.
    pub capacity: u64,
    /// Force the naive recursive algorithms for `state`, `prove_inclusion`
    /// and `prove_consistency`. Exists for cross-validation in tests; the
    /// iterative path is always preferred in production.
    pub disable_optimizations: bool,
    /// Bypass the subroot cache while still using the iterative
    /// algorithms. Outputs are unaffected; only performance differs.
    pub disable_cache: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            algorithm: HashAlgorithm::Sha256,
            security: true,
            threshold: DEFAULT_THRESHOLD,
            capacity: DEFAULT_CAPACITY_BYTES,
            disable_optimizations: false,
            disable_cache: false,
        }
    }
}

impl TreeConfig {
    /// Builds a config from an algorithm name, e.g. `"sha3_256"`.
    pub fn with_algorithm_name(name: &str) -> Result<Self, UnsupportedAlgorithm> {
        Ok(TreeConfig {
            algorithm: name.parse()?,
            ..TreeConfig::default()
        })
    }
}

/// Thin aggregator wiring the hasher, storage, range engine, subroot
/// cache, and provers into the operations a caller actually uses.
pub struct MerkleTree<S: LeafLog> {
    storage: S,
    hasher: Hasher,
    cache: SubrootCache,
    disable_optimizations: bool,
}

impl<S: LeafLog> MerkleTree<S> {
    /// Wires a storage backend with the given configuration.
    pub fn new(storage: S, config: TreeConfig) -> Self {
        let threshold = if config.disable_cache {
            u64::MAX
        } else {
            config.threshold
        };
        MerkleTree {
            storage,
            hasher: Hasher::new(config.algorithm, config.security),
            cache: SubrootCache::new(config.capacity, threshold),
            disable_optimizations: config.disable_optimizations,
        }
    }

    /// Appends `entry`, returning its 1-based index.
    pub fn append(&self, entry: &[u8]) -> Result<u64, TreeError> {
        let hash = self.hasher.hash_leaf(entry);
        let index = self.storage.append(entry, hash)?;
        tracing::trace!(index, bytes = entry.len(), "appended leaf");
        Ok(index)
    }

    /// Appends many entries, computing leaf hashes in chunks rather than
    /// one at a time. Ingestion throughput helper recommended by the
    /// storage contract; semantically identical to calling [`Self::append`]
    /// for each entry in order.
    pub fn append_entries(&self, entries: &[&[u8]]) -> Result<Vec<u64>, TreeError> {
        const CHUNK_SIZE: usize = 100_000;
        let mut indices = Vec::with_capacity(entries.len());
        for chunk in entries.chunks(CHUNK_SIZE) {
            for entry in chunk {
                indices.push(self.append(entry)?);
            }
        }
        indices
            .last()
            .map(|&last| tracing::debug!(count = entries.len(), last_index = last, "bulk append complete"));
        Ok(indices)
    }

    /// The current number of appended entries.
    pub fn size(&self) -> u64 {
        self.storage.size()
    }

    /// Direct read access to the underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn check_size(&self, size: u64) -> Result<(), TreeError> {
        let current = self.storage.size();
        if size > current {
            return Err(InvalidChallenge::SizeExceedsCurrent {
                requested: size,
                current,
            }
            .into());
        }
        Ok(())
    }

    /// The root digest over the first `size` entries (defaults to the
    /// current size).
    pub fn state(&self, size: Option<u64>) -> Result<Digest, TreeError> {
        let size = size.unwrap_or_else(|| self.storage.size());
        self.check_size(size)?;
        if self.disable_optimizations {
            get_root_naive(&self.storage, &self.hasher, 0, size)
        } else {
            get_root(&self.storage, &self.hasher, &self.cache, 0, size)
        }
    }

    /// Proves that the entry at `index` (1-based) belongs to the subtree
    /// of `size` entries (defaults to the current size).
    pub fn prove_inclusion(&self, index: u64, size: Option<u64>) -> Result<Proof, TreeError> {
        let size = size.unwrap_or_else(|| self.storage.size());
        self.check_size(size)?;
        if index < 1 || index > size {
            return Err(InvalidChallenge::IndexOutOfRange { index, size }.into());
        }
        if self.disable_optimizations {
            prove_inclusion_naive(&self.storage, &self.hasher, index, size)
        } else {
            prove_inclusion(&self.storage, &self.hasher, &self.cache, index, size)
        }
    }

    /// Proves that the tree of `size1` entries is a prefix of the tree of
    /// `size2` entries (`size2` defaults to the current size).
    pub fn prove_consistency(&self, size1: u64, size2: Option<u64>) -> Result<Proof, TreeError> {
        let size2 = size2.unwrap_or_else(|| self.storage.size());
        self.check_size(size2)?;
        if size1 > size2 {
            return Err(InvalidChallenge::SizesOutOfOrder { size1, size2 }.into());
        }
        if self.disable_optimizations {
            prove_consistency_naive(&self.storage, &self.hasher, size1, size2)
        } else {
            prove_consistency(&self.storage, &self.hasher, &self.cache, size1, size2)
        }
    }

    /// Snapshot of the subroot cache's counters.
    pub fn cache_info(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Discards all cached subroots and resets the hit/miss counters.
    pub fn cache_clear(&self) {
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{storage::InMemoryLog, verify::verify_inclusion};

    fn tree_with(entries: &[&[u8]]) -> MerkleTree<InMemoryLog> {
        let tree = MerkleTree::new(InMemoryLog::new(), TreeConfig::default());
        for e in entries {
            tree.append(e).unwrap();
        }
        tree
    }

    #[test]
    fn empty_state_matches_empty_sha256_vector() {
        let tree = tree_with(&[]);
        assert_eq!(
            tree.state(None).unwrap().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn singleton_state_matches_hash_leaf() {
        let tree = tree_with(&[b"a"]);
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        assert_eq!(tree.state(None).unwrap(), hasher.hash_leaf(b"a"));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let tree = tree_with(&[b"a", b"b"]);
        assert!(matches!(
            tree.prove_inclusion(3, None),
            Err(TreeError::InvalidChallenge(InvalidChallenge::IndexOutOfRange { .. }))
        ));
    }

    #[test]
    fn sizes_out_of_order_are_rejected() {
        let tree = tree_with(&[b"a", b"b"]);
        assert!(matches!(
            tree.prove_consistency(2, Some(1)),
            Err(TreeError::InvalidChallenge(InvalidChallenge::SizesOutOfOrder { .. }))
        ));
    }

    #[test]
    fn prefix_state_is_stable_across_later_appends() {
        let tree = tree_with(&[b"a", b"b", b"c"]);
        let snapshot = tree.state(Some(2)).unwrap();
        tree.append(b"d").unwrap();
        tree.append(b"e").unwrap();
        assert_eq!(tree.state(Some(2)).unwrap(), snapshot);
    }

    #[test]
    fn disabling_optimizations_matches_default_path() {
        let optimized = MerkleTree::new(InMemoryLog::new(), TreeConfig::default());
        let naive = MerkleTree::new(
            InMemoryLog::new(),
            TreeConfig {
                disable_optimizations: true,
                ..TreeConfig::default()
            },
        );
        for i in 0..20 {
            let entry = format!("item-{i}").into_bytes();
            optimized.append(&entry).unwrap();
            naive.append(&entry).unwrap();
        }
        for n in 0..=20 {
            assert_eq!(optimized.state(Some(n)).unwrap(), naive.state(Some(n)).unwrap());
        }
        let a = optimized.prove_inclusion(5, None).unwrap();
        let b = naive.prove_inclusion(5, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bulk_append_matches_sequential_append() {
        let entries: Vec<Vec<u8>> = (0..10).map(|i| format!("bulk-{i}").into_bytes()).collect();
        let refs: Vec<&[u8]> = entries.iter().map(|e| e.as_slice()).collect();

        let sequential = MerkleTree::new(InMemoryLog::new(), TreeConfig::default());
        for e in &refs {
            sequential.append(e).unwrap();
        }

        let bulk = MerkleTree::new(InMemoryLog::new(), TreeConfig::default());
        let indices = bulk.append_entries(&refs).unwrap();

        assert_eq!(indices, (1..=10).collect::<Vec<_>>());
        assert_eq!(sequential.state(None).unwrap(), bulk.state(None).unwrap());
    }

    #[test]
    fn full_round_trip_through_the_verifier() {
        let tree = tree_with(&[b"a", b"b", b"c"]);
        let root = tree.state(None).unwrap();
        let proof = tree.prove_inclusion(2, None).unwrap();
        verify_inclusion(&proof, &root).unwrap();
    }
}
