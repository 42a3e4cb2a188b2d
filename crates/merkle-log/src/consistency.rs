use merkle_hash::{Digest, Hasher};

use crate::{
    cache::SubrootCache,
    error::TreeError,
    proof::Proof,
    range::{get_root, get_root_naive},
    storage::LeafLog,
};

fn largest_pow2_lt(n: u64) -> u64 {
    n.next_power_of_two() / 2
}

fn terminal(offset: u64, end: u64) -> bool {
    offset == end || (offset == 0 && end == 1)
}

/// Builds a consistency proof certifying that `size1` is a prefix of
/// `size2`, using the iterative stack-based walk.
///
/// Callers are expected to have already validated `size1 <= size2`.
pub(crate) fn prove_consistency(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    cache: &SubrootCache,
    size1: u64,
    size2: u64,
) -> Result<Proof, TreeError> {
    let mut start = 0u64;
    let mut offset = size1;
    let mut end = size2;
    let mut bit = 0u8;
    let mut stack: Vec<(u8, u8, (u64, u64))> = Vec::new();

    while !terminal(offset, end) {
        let k = largest_pow2_lt(end);
        if offset < k {
            stack.push((bit, 0, (start + k, start + end)));
            end = k;
            bit = 0;
        } else {
            stack.push((bit, 1, (start, start + k)));
            start += k;
            offset -= k;
            end -= k;
            bit = 1;
        }
    }

    let (base_digest, base_mask) = if offset == end {
        (get_root(storage, hasher, cache, start, start + end)?, 1)
    } else {
        (storage.get_leaf(start + offset + 1)?, 0)
    };

    let mut rule = vec![bit];
    let mut subset = vec![base_mask];
    let mut path = vec![base_digest];
    while let Some((step_bit, mask, (a, b))) = stack.pop() {
        rule.push(step_bit);
        subset.push(mask);
        path.push(get_root(storage, hasher, cache, a, b)?);
    }
    if let Some(last) = rule.last_mut() {
        *last = 0;
    }

    Ok(Proof {
        algorithm: hasher.algorithm(),
        security: hasher.security(),
        size: size2,
        rule,
        subset,
        path,
    })
}

/// Reference recursive form, used for cross-validation and when
/// `disable_optimizations` is set. Produces the same path in the same
/// order as the iterative walk, by structural induction on it.
pub(crate) fn prove_consistency_naive(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    size1: u64,
    size2: u64,
) -> Result<Proof, TreeError> {
    let mut rule = Vec::new();
    let mut subset = Vec::new();
    let mut path = Vec::new();
    walk_naive(storage, hasher, 0, size1, size2, 0, &mut rule, &mut subset, &mut path)?;
    if let Some(last) = rule.last_mut() {
        *last = 0;
    }
    Ok(Proof {
        algorithm: hasher.algorithm(),
        security: hasher.security(),
        size: size2,
        rule,
        subset,
        path,
    })
}

#[allow(clippy::too_many_arguments)]
fn walk_naive(
    storage: &dyn LeafLog,
    hasher: &Hasher,
    start: u64,
    offset: u64,
    end: u64,
    bit: u8,
    rule: &mut Vec<u8>,
    subset: &mut Vec<u8>,
    path: &mut Vec<Digest>,
) -> Result<(), TreeError> {
    if terminal(offset, end) {
        if offset == end {
            path.push(get_root_naive(storage, hasher, start, start + end)?);
            subset.push(1);
        } else {
            path.push(storage.get_leaf(start + offset + 1)?);
            subset.push(0);
        }
        rule.push(bit);
        return Ok(());
    }

    let k = largest_pow2_lt(end);
    if offset < k {
        walk_naive(storage, hasher, start, offset, k, 0, rule, subset, path)?;
        path.push(get_root_naive(storage, hasher, start + k, start + end)?);
        subset.push(0);
    } else {
        walk_naive(
            storage,
            hasher,
            start + k,
            offset - k,
            end - k,
            1,
            rule,
            subset,
            path,
        )?;
        path.push(get_root_naive(storage, hasher, start, start + k)?);
        subset.push(1);
    }
    rule.push(bit);
    Ok(())
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
    fn proof_shape_satisfies_rule_and_subset_length_invariant() {
        let entries: Vec<Vec<u8>> = (0..5).map(|i| vec![b'a' + i]).collect();
        let refs: Vec<&[u8]> = entries.iter().map(|e| e.as_slice()).collect();
        let (log, hasher, cache) = seeded(&refs);
        let proof = prove_consistency(&log, &hasher, &cache, 3, 5).unwrap();
        assert_eq!(proof.rule.len(), proof.path.len());
        assert_eq!(proof.subset.len(), proof.path.len());
    }

    #[test]
    fn iterative_and_naive_proofs_agree_across_all_prefixes() {
        let entries: Vec<Vec<u8>> = (0..19).map(|i| format!("x{i}").into_bytes()).collect();
        let refs: Vec<&[u8]> = entries.iter().map(|e| e.as_slice()).collect();
        let (log, hasher, cache) = seeded(&refs);
        let n = refs.len() as u64;
        for m in 0..=n {
            let iterative = prove_consistency(&log, &hasher, &cache, m, n).unwrap();
            let naive = prove_consistency_naive(&log, &hasher, m, n).unwrap();
            assert_eq!(iterative, naive, "mismatch at size1={m}");
        }
    }
}
