use std::{fmt, str::FromStr};

use digest::Digest as _;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use thiserror::Error;

/// A hash algorithm supported by the tree, chosen at construction time.
///
/// Unlike a type-parameterized digest, the algorithm here is a runtime
/// value so that a tree can be rebuilt from a persisted configuration
/// (`{"algorithm": "sha3_256", ...}`) without recompiling against a
/// different `Digest` type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HashAlgorithm {
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
}

/// Raised when constructing a hasher from an algorithm name that is not
/// recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported hash algorithm '{0}'")]
pub struct UnsupportedAlgorithm(pub String);

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_224 => "sha3_224",
            HashAlgorithm::Sha3_256 => "sha3_256",
            HashAlgorithm::Sha3_384 => "sha3_384",
            HashAlgorithm::Sha3_512 => "sha3_512",
        };
        write!(f, "{name}")
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha3_224" => Ok(HashAlgorithm::Sha3_224),
            "sha3_256" => Ok(HashAlgorithm::Sha3_256),
            "sha3_384" => Ok(HashAlgorithm::Sha3_384),
            "sha3_512" => Ok(HashAlgorithm::Sha3_512),
            _ => Err(UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

impl HashAlgorithm {
    /// Length in bytes of a digest produced by this algorithm.
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 => 64,
        }
    }

    /// Starts an incremental digest computation for this algorithm.
    pub(crate) fn engine(&self) -> DigestEngine {
        match self {
            HashAlgorithm::Sha224 => DigestEngine::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => DigestEngine::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => DigestEngine::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => DigestEngine::Sha512(Sha512::new()),
            HashAlgorithm::Sha3_224 => DigestEngine::Sha3_224(Sha3_224::new()),
            HashAlgorithm::Sha3_256 => DigestEngine::Sha3_256(Sha3_256::new()),
            HashAlgorithm::Sha3_384 => DigestEngine::Sha3_384(Sha3_384::new()),
            HashAlgorithm::Sha3_512 => DigestEngine::Sha3_512(Sha3_512::new()),
        }
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Type-erased incremental hash state, one variant per supported algorithm.
pub(crate) enum DigestEngine {
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha3_224(Sha3_224),
    Sha3_256(Sha3_256),
    Sha3_384(Sha3_384),
    Sha3_512(Sha3_512),
}

impl DigestEngine {
    pub(crate) fn update(&mut self, chunk: &[u8]) {
        match self {
            DigestEngine::Sha224(d) => d.update(chunk),
            DigestEngine::Sha256(d) => d.update(chunk),
            DigestEngine::Sha384(d) => d.update(chunk),
            DigestEngine::Sha512(d) => d.update(chunk),
            DigestEngine::Sha3_224(d) => d.update(chunk),
            DigestEngine::Sha3_256(d) => d.update(chunk),
            DigestEngine::Sha3_384(d) => d.update(chunk),
            DigestEngine::Sha3_512(d) => d.update(chunk),
        }
    }

    pub(crate) fn finalize(self) -> Vec<u8> {
        match self {
            DigestEngine::Sha224(d) => d.finalize().to_vec(),
            DigestEngine::Sha256(d) => d.finalize().to_vec(),
            DigestEngine::Sha384(d) => d.finalize().to_vec(),
            DigestEngine::Sha512(d) => d.finalize().to_vec(),
            DigestEngine::Sha3_224(d) => d.finalize().to_vec(),
            DigestEngine::Sha3_256(d) => d.finalize().to_vec(),
            DigestEngine::Sha3_384(d) => d.finalize().to_vec(),
            DigestEngine::Sha3_512(d) => d.finalize().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_known_names_case_and_dash_insensitively() {
        assert_eq!("sha256".parse(), Ok(HashAlgorithm::Sha256));
        assert_eq!("SHA256".parse(), Ok(HashAlgorithm::Sha256));
        assert_eq!("sha3-256".parse(), Ok(HashAlgorithm::Sha3_256));
        assert_eq!("sha3_256".parse(), Ok(HashAlgorithm::Sha3_256));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "md5".parse::<HashAlgorithm>(),
            Err(UnsupportedAlgorithm("md5".to_owned()))
        );
    }

    #[test]
    fn output_sizes_match_rfc_lengths() {
        assert_eq!(HashAlgorithm::Sha256.output_size(), 32);
        assert_eq!(HashAlgorithm::Sha512.output_size(), 64);
        assert_eq!(HashAlgorithm::Sha3_224.output_size(), 28);
    }
}
