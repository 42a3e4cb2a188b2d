use merkle_hash::{Digest, Hasher};

use crate::{error::InvalidProof, proof::Proof};

/// Folds a path against its rule bits into a single accumulator digest.
///
/// `rule[i]` (for `i < path.len() - 1`) tells how `path[i + 1]` joins the
/// accumulator already built from `path[0..=i]`: `0` pairs the
/// accumulator on the left, `1` on the right. The last rule bit is
/// never consulted, matching its normalized, insignificant status.
fn fold(hasher: &Hasher, rule: &[u8], path: &[Digest]) -> Digest {
    let mut accumulator = path[0].clone();
    for (i, digest) in path.iter().enumerate().skip(1) {
        accumulator = if rule[i - 1] == 0 {
            hasher.hash_pair(&accumulator, digest)
        } else {
            hasher.hash_pair(digest, &accumulator)
        };
    }
    accumulator
}

/// Verifies an inclusion proof against `target`.
pub fn verify_inclusion(proof: &Proof, target: &Digest) -> Result<(), InvalidProof> {
    proof.check_shape()?;
    if proof.is_consistency() {
        return Err(InvalidProof::Malformed(
            "verify_inclusion called with a consistency proof (subset is non-empty)".to_owned(),
        ));
    }
    let hasher = Hasher::new(proof.algorithm, proof.security);
    let accumulator = fold(&hasher, &proof.rule, &proof.path);
    if &accumulator == target {
        Ok(())
    } else {
        Err(InvalidProof::Mismatch)
    }
}

/// The old- and new-tree roots reconstructed from a consistency proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyRoots {
    /// Root of the earlier tree (`size1` leaves).
    pub old_root: Digest,
    /// Root of the later tree (`size2` leaves, i.e. `proof.size`).
    pub new_root: Digest,
}

/// Reconstructs both roots committed to by a consistency proof, without
/// comparing them to any target.
pub fn consistency_roots(proof: &Proof) -> Result<ConsistencyRoots, InvalidProof> {
    proof.check_shape()?;
    if !proof.is_consistency() {
        return Err(InvalidProof::Malformed(
            "consistency_roots called with an inclusion proof (subset is empty)".to_owned(),
        ));
    }
    let hasher = Hasher::new(proof.algorithm, proof.security);
    let new_root = fold(&hasher, &proof.rule, &proof.path);

    let (old_rule, old_path): (Vec<u8>, Vec<Digest>) = proof
        .rule
        .iter()
        .zip(proof.subset.iter())
        .zip(proof.path.iter())
        .filter(|((_, &subset_bit), _)| subset_bit == 1)
        .map(|((&rule_bit, _), digest)| (rule_bit, digest.clone()))
        .unzip();
    if old_path.is_empty() {
        return Err(InvalidProof::Malformed(
            "proof carries no old-tree (subset = 1) steps".to_owned(),
        ));
    }
    let old_root = fold(&hasher, &old_rule, &old_path);

    Ok(ConsistencyRoots { old_root, new_root })
}

/// Verifies a consistency proof against both the claimed old and new
/// root commitments.
pub fn verify_consistency(
    proof: &Proof,
    old_target: &Digest,
    new_target: &Digest,
) -> Result<(), InvalidProof> {
    let roots = consistency_roots(proof)?;
    if &roots.old_root != old_target || &roots.new_root != new_target {
        return Err(InvalidProof::Mismatch);
    }
    Ok(())
}
