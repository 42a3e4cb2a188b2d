use std::collections::VecDeque;

use merkle_hash::{Digest, Hasher};

use crate::{cache::SubrootCache, error::TreeError, storage::LeafLog};

/// Largest power of two strictly less than `n` (`n` must be `>= 1`).
fn largest_pow2_lt(n: u64) -> u64 {
    debug_assert!(n >= 1);
    n.next_power_of_two() / 2
}

/// Exponents of the powers of two that sum to `n`, largest first. E.g.
/// `decompose(11) == [3, 1, 0]` (8 + 2 + 1).
pub(crate) fn decompose(mut n: u64) -> Vec<u32> {
    let mut exponents = Vec::new();
    while n > 0 {
        let exponent = 63 - n.leading_zeros();
        exponents.push(exponent);
        n -= 1 << exponent;
    }
    exponents
}

/// Root digest over `[start, end)`, using the subroot cache and the
/// iterative decompose-and-fold algorithm.
///
/// Principal subroots are assembled left to right as in the classic
/// balanced decomposition (widest first), then folded right to left so
/// that the widest subroot absorbs the others last.
pub(crate) fn get_root(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    cache: &SubrootCache,
    start: u64,
    end: u64,
) -> Result<Digest, TreeError> {
    if start == end {
        return Ok(hasher.hash_empty());
    }
    let exponents = decompose(end - start);
    let mut limit = end;
    let mut subroots: VecDeque<Digest> = VecDeque::with_capacity(exponents.len());
    for exponent in exponents.iter().rev() {
        let width = 1u64 << exponent;
        let offset = limit - width;
        subroots.push_front(get_subroot(storage, hasher, cache, offset, width)?);
        limit = offset;
    }
    debug_assert!(!subroots.is_empty(), "decompose(end - start) is non-empty whenever end > start");
    let mut acc = match subroots.pop_back() {
        Some(digest) => digest,
        None => return Ok(hasher.hash_empty()),
    };
    while let Some(next) = subroots.pop_back() {
        acc = hasher.hash_pair(&next, &acc);
    }
    Ok(acc)
}

/// Root digest over `[start, end)` computed by the reference recursive
/// definition, with no cache involvement. Used for cross-validation and
/// whenever the tree is configured with `disable_optimizations`.
pub(crate) fn get_root_naive(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    start: u64,
    end: u64,
) -> Result<Digest, TreeError> {
    let width = end - start;
    if width == 0 {
        return Ok(hasher.hash_empty());
    }
    if width == 1 {
        return storage.get_leaf(start + 1);
    }
    let k = largest_pow2_lt(width);
    let left = get_root_naive(storage, hasher, start, start + k)?;
    let right = get_root_naive(storage, hasher, start + k, end)?;
    Ok(hasher.hash_pair(&left, &right))
}

/// The digest of the perfect subtree `[offset, offset + width)`, served
/// from the cache when `width` clears the admission threshold.
pub(crate) fn get_subroot(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    cache: &SubrootCache,
    offset: u64,
    width: u64,
) -> Result<Digest, TreeError> {
    if width == 1 {
        return storage.get_leaf(offset + 1);
    }
    cache.get_or_compute(offset, width, || {
        get_subroot_uncached(storage, hasher, offset, width)
    })
}

/// Computes a perfect subtree's digest directly, by repeated pairwise
/// folding of its leaf hashes, bypassing the cache entirely.
pub(crate) fn get_subroot_uncached(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    offset: u64,
    width: u64,
) -> Result<Digest, TreeError> {
    debug_assert!(width >= 1, "a subtree always spans at least one leaf");
    let mut level: VecDeque<Digest> = storage.get_range(offset, width)?.into();
    while level.len() > 1 {
        let mut next_level = VecDeque::with_capacity(level.len().div_ceil(2));
        while let (Some(left), Some(right)) = (level.pop_front(), level.pop_front()) {
            next_level.push_back(hasher.hash_pair(&left, &right));
        }
        level = next_level;
    }
    Ok(level.pop_front().unwrap_or_else(|| hasher.hash_empty()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::SubrootCache;
    use crate::storage::InMemoryLog;
    use merkle_hash::HashAlgorithm;

    fn seeded_log(entries: &[&[u8]], hasher: &Hasher) -> InMemoryLog {
        let log = InMemoryLog::new();
        for entry in entries {
            log.append(entry, hasher.hash_leaf(entry)).unwrap();
        }
        log
    }

    #[test]
    fn decompose_matches_documented_example() {
        assert_eq!(decompose(11), vec![3, 1, 0]);
        assert_eq!(decompose(1), vec![0]);
        assert_eq!(decompose(8), vec![3]);
    }

    #[test]
    fn empty_range_is_hash_empty() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let log = InMemoryLog::new();
        let cache = SubrootCache::new(1 << 20, 128);
        assert_eq!(
            get_root(&log, &hasher, &cache, 0, 0).unwrap(),
            hasher.hash_empty()
        );
    }

    #[test]
    fn three_leaf_root_matches_nested_pairing() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let log = seeded_log(&[b"a", b"b", b"c"], &hasher);
        let cache = SubrootCache::new(1 << 20, 128);
        let root = get_root(&log, &hasher, &cache, 0, 3).unwrap();
        let expected = hasher.hash_pair(
            &hasher.hash_pair(&hasher.hash_leaf(b"a"), &hasher.hash_leaf(b"b")),
            &hasher.hash_leaf(b"c"),
        );
        assert_eq!(root, expected);
    }

    #[test]
    fn iterative_and_naive_roots_agree() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let entries: Vec<Vec<u8>> = (0..37).map(|i| format!("entry-{i}").into_bytes()).collect();
        let refs: Vec<&[u8]> = entries.iter().map(|e| e.as_slice()).collect();
        let log = seeded_log(&refs, &hasher);
        let cache = SubrootCache::new(1 << 20, 4);
        for n in 0..=refs.len() as u64 {
            let iterative = get_root(&log, &hasher, &cache, 0, n).unwrap();
            let naive = get_root_naive(&log, &hasher, 0, n).unwrap();
            assert_eq!(iterative, naive, "mismatch at n={n}");
        }
    }
}
