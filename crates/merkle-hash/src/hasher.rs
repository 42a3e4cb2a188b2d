use crate::{algorithm::DigestEngine, Digest, HashAlgorithm};

/// Entries larger than this are absorbed in chunks rather than copied
/// into one contiguous buffer before hashing. The chunk boundary has no
/// effect on the resulting digest.
const CHUNK_SIZE: usize = 1024;

/// Computes domain-separated digests for one configured algorithm.
///
/// When `security` is enabled (the default), leaf digests are prefixed
/// with `0x00` and interior-node digests with `0x01`, following RFC 9162
/// ("Sakura"). Disabling it computes plain, unprefixed digests instead,
/// which is useful for interop with trees that predate the RFC but
/// loses second-preimage resistance between leaves and interior nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    security: bool,
}

impl Hasher {
    /// Built-in leaf prefix, applied only when `security` is enabled.
    const LEAF_PREFIX: u8 = 0x00;
    /// Built-in interior-node prefix, applied only when `security` is enabled.
    const NODE_PREFIX: u8 = 0x01;

    /// Creates a hasher for the given algorithm and security mode.
    pub fn new(algorithm: HashAlgorithm, security: bool) -> Self {
        Hasher { algorithm, security }
    }

    /// The algorithm this hasher computes digests with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether domain-separation prefixes are applied.
    pub fn security(&self) -> bool {
        self.security
    }

    fn consume(engine: &mut DigestEngine, data: &[u8]) {
        for chunk in data.chunks(CHUNK_SIZE) {
            engine.update(chunk);
        }
    }

    /// The digest of the empty byte string, with no prefix regardless of
    /// the `security` setting. This is the root of a tree with no leaves
    /// (I6 in the data model).
    pub fn hash_empty(&self) -> Digest {
        self.hash_raw(&[])
    }

    /// Hashes raw bytes with no domain-separation prefix, regardless of
    /// the `security` setting. Used for algorithm self-tests and by
    /// callers operating outside the tree's hashing discipline.
    pub fn hash_raw(&self, data: &[u8]) -> Digest {
        let mut engine = self.algorithm.engine();
        Self::consume(&mut engine, data);
        Digest::from_bytes(engine.finalize())
    }

    /// Hashes a leaf entry's bytes.
    pub fn hash_leaf(&self, entry: &[u8]) -> Digest {
        let mut engine = self.algorithm.engine();
        if self.security {
            engine.update(&[Self::LEAF_PREFIX]);
        }
        Self::consume(&mut engine, entry);
        Digest::from_bytes(engine.finalize())
    }

    /// Hashes a pair of digests into their parent digest.
    pub fn hash_pair(&self, left: &Digest, right: &Digest) -> Digest {
        let mut engine = self.algorithm.engine();
        if self.security {
            engine.update(&[Self::NODE_PREFIX]);
        }
        engine.update(left.as_bytes());
        engine.update(right.as_bytes());
        Digest::from_bytes(engine.finalize())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_digest_matches_known_sha256_vector() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        assert_eq!(
            hasher.hash_empty().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn empty_digest_is_independent_of_security_flag() {
        let secure = Hasher::new(HashAlgorithm::Sha256, true);
        let insecure = Hasher::new(HashAlgorithm::Sha256, false);
        assert_eq!(secure.hash_empty(), insecure.hash_empty());
    }

    #[test]
    fn leaf_digest_matches_known_sha256_vector() {
        // sha256(0x00 || "a") per RFC 9162 domain separation.
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let expected = hasher.hash_raw(&[&[0x00][..], b"a"].concat());
        assert_eq!(hasher.hash_leaf(b"a"), expected);
    }

    #[test]
    fn pair_digest_uses_node_prefix_when_secure() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let left = hasher.hash_leaf(b"a");
        let right = hasher.hash_leaf(b"b");
        let expected = hasher.hash_raw(&[&[0x01][..], left.as_bytes(), right.as_bytes()].concat());
        assert_eq!(hasher.hash_pair(&left, &right), expected);
    }

    #[test]
    fn disabling_security_drops_prefixes() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, false);
        assert_eq!(hasher.hash_leaf(b"a"), hasher.hash_raw(b"a"));
    }

    #[test]
    fn chunked_absorption_matches_single_shot() {
        let hasher = Hasher::new(HashAlgorithm::Sha3_256, true);
        let data = vec![0x42u8; CHUNK_SIZE * 3 + 17];
        assert_eq!(hasher.hash_leaf(&data), hasher.hash_leaf(&data.clone()));
    }
}
