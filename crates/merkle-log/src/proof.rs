use merkle_hash::{Digest, HashAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::InvalidProof;

/// A self-describing inclusion or consistency proof: everything a
/// verifier needs except the target commitment(s).
///
/// `subset` is empty for inclusion proofs. For consistency proofs,
/// `subset[i] == 1` marks steps that belong to the old tree and must be
/// folded to reconstruct its root; all steps participate in the new
/// root. See the recommended JSON shape in this crate's documentation
/// for the wire-level rendering of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Hash algorithm to reconstruct the hasher with.
    pub algorithm: HashAlgorithm,
    /// Whether domain-separation prefixes were applied.
    pub security: bool,
    /// The claimed subtree size (inclusion) or later-tree size (consistency).
    pub size: u64,
    /// Direction bits: `0` if the partner is on the right of the
    /// accumulator at that step, `1` if on the left.
    pub rule: Vec<u8>,
    /// Consistency-only membership bits; empty for inclusion proofs.
    pub subset: Vec<u8>,
    /// The path of digests folded against the rule (and subset) bits.
    pub path: Vec<Digest>,
}

impl Proof {
    /// Checks the structural invariants from the data model: `rule` and
    /// `path` have equal length, and `subset` is either empty or matches
    /// them in length.
    pub(crate) fn check_shape(&self) -> Result<(), InvalidProof> {
        if self.rule.len() != self.path.len() {
            return Err(InvalidProof::Malformed(format!(
                "rule has {} entries but path has {}",
                self.rule.len(),
                self.path.len()
            )));
        }
        if !self.subset.is_empty() && self.subset.len() != self.path.len() {
            return Err(InvalidProof::Malformed(format!(
                "subset has {} entries but path has {}",
                self.subset.len(),
                self.path.len()
            )));
        }
        if self.rule.iter().chain(self.subset.iter()).any(|&b| b > 1) {
            return Err(InvalidProof::Malformed(
                "rule and subset bits must be 0 or 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// True if this is a consistency proof (carries subset bits).
    pub fn is_consistency(&self) -> bool {
        !self.subset.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Proof {
        Proof {
            algorithm: HashAlgorithm::Sha256,
            security: true,
            size: 3,
            rule: vec![0, 0, 0],
            subset: vec![],
            path: vec![
                Digest::from_hex("aa").unwrap(),
                Digest::from_hex("bb").unwrap(),
                Digest::from_hex("cc").unwrap(),
            ],
        }
    }

    #[test]
    fn serializes_to_documented_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["algorithm"], "sha256");
        assert_eq!(json["security"], true);
        assert_eq!(json["path"][0], "aa");
        assert_eq!(json["subset"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn rejects_mismatched_rule_and_path_lengths() {
        let mut proof = sample();
        proof.rule.push(1);
        assert!(proof.check_shape().is_err());
    }
}
