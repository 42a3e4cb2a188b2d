use merkle_hash::{Digest, Hasher};

use crate::{
    cache::SubrootCache,
    error::TreeError,
    proof::Proof,
    range::{get_root, get_root_naive},
    storage::LeafLog,
};

/// Largest power of two strictly less than `n` (`n` must be `>= 1`).
fn largest_pow2_lt(n: u64) -> u64 {
    n.next_power_of_two() / 2
}

/// Builds an inclusion proof for `index` (1-based) against a subtree of
/// `size` leaves, using the iterative stack-based walk.
///
/// Callers are expected to have already validated `1 <= index <= size`.
pub(crate) fn prove_inclusion(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    cache: &SubrootCache,
    index: u64,
    size: u64,
) -> Result<Proof, TreeError> {
    let offset = index - 1;
    let mut start = 0u64;
    let mut end = size;
    let mut bit = 0u8;
    let mut stack: Vec<(u8, (u64, u64))> = Vec::new();

    while end - start > 1 {
        let k = largest_pow2_lt(end - start);
        if offset < start + k {
            stack.push((bit, (start + k, end)));
            end = start + k;
            bit = 0;
        } else {
            stack.push((bit, (start, start + k)));
            start += k;
            bit = 1;
        }
    }

    let mut rule = vec![bit];
    let mut path = vec![storage.get_leaf(offset + 1)?];
    while let Some((step_bit, (a, b))) = stack.pop() {
        rule.push(step_bit);
        path.push(get_root(storage, hasher, cache, a, b)?);
    }
    normalize_last_rule_bit(&mut rule);

    Ok(Proof {
        algorithm: hasher.algorithm(),
        security: hasher.security(),
        size,
        rule,
        subset: Vec::new(),
        path,
    })
}

/// Reference recursive form of inclusion path construction, used for
/// cross-validation and when `disable_optimizations` is set.
pub(crate) fn prove_inclusion_naive(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    index: u64,
    size: u64,
) -> Result<Proof, TreeError> {
    let mut rule = Vec::new();
    let mut path = Vec::new();
    walk_naive(storage, hasher, index - 1, 0, size, &mut rule, &mut path)?;
    normalize_last_rule_bit(&mut rule);
    Ok(Proof {
        algorithm: hasher.algorithm(),
        security: hasher.security(),
        size,
        rule,
        subset: Vec::new(),
        path,
    })
}

fn walk_naive(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    offset: u64,
    start: u64,
    end: u64,
    rule: &mut Vec<u8>,
    path: &mut Vec<Digest>,
) -> Result<(), TreeError> {
    if end - start == 1 {
        path.push(storage.get_leaf(start + 1)?);
        rule.push(0);
        return Ok(());
    }
    let k = largest_pow2_lt(end - start);
    if offset < start + k {
        walk_naive(storage, hasher, offset, start, start + k, rule, path)?;
        path.push(get_root_naive(storage, hasher, start + k, end)?);
        rule.push(0);
    } else {
        walk_naive(storage, hasher, offset, start + k, end, rule, path)?;
        path.push(get_root_naive(storage, hasher, start, start + k)?);
        rule.push(1);
    }
    Ok(())
}

/// The last rule bit carries no information (nothing follows it) and
/// MUST be normalized to 0 so independently-built proofs compare equal.
fn normalize_last_rule_bit(rule: &mut [u8]) {
    if let Some(last) = rule.last_mut() {
        *last = 0;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::InMemoryLog;
    use merkle_hash::HashAlgorithm;

    fn seeded(entries: &[&[u8]]) -> (InMemoryLog, Hasher, SubrootCache) {
        let hasher = Hasher::new(HashAlgorithm::Sha256, true);
        let log = InMemoryLog::new();
        for e in entries {
            log.append(e, hasher.hash_leaf(e)).unwrap();
        }
        (log, hasher, SubrootCache::new(1 << 20, 128))
    }

    #[test]
    fn three_leaf_inclusion_matches_documented_scenario() {
        let (log, hasher, cache) = seeded(&[b"a", b"b", b"c"]);
        let proof = prove_inclusion(&log, &hasher, &cache, 1, 3).unwrap();
        assert_eq!(proof.rule, vec![0, 0, 0]);
        assert_eq!(proof.path[0], hasher.hash_leaf(b"a"));
        assert_eq!(proof.path[1], hasher.hash_leaf(b"b"));
        assert_eq!(proof.path[2], hasher.hash_leaf(b"c"));
    }

    #[test]
    fn iterative_and_naive_proofs_agree_across_all_indices() {
        let entries: Vec<Vec<u8>> = (0..23).map(|i| format!("e{i}").into_bytes()).collect();
        let refs: Vec<&[u8]> = entries.iter().map(|e| e.as_slice()).collect();
        let (log, hasher, cache) = seeded(&refs);
        for index in 1..=refs.len() as u64 {
            let iterative = prove_inclusion(&log, &hasher, &cache, index, refs.len() as u64).unwrap();
            let naive = prove_inclusion_naive(&log, &hasher, index, refs.len() as u64).unwrap();
            assert_eq!(iterative, naive, "mismatch at index={index}");
        }
    }
}
