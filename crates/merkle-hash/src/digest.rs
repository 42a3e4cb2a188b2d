use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The output of a hash computation: an opaque sequence of bytes tagged
/// with the algorithm that produced it.
///
/// `Digest` does not carry the algorithm as a type parameter (contrast
/// `warg_crypto::Hash<D>`) because the algorithm itself is a runtime
/// choice here; callers that need to check compatibility between two
/// digests compare their lengths or ask the owning [`Hasher`](crate::Hasher).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(Vec<u8>);

/// Raised when a byte string cannot be interpreted as a digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex encoding was malformed.
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),
}

impl Digest {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Digest(bytes)
    }

    /// Borrows the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the digest, returning its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes in this digest.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if this digest is empty. Never the case for any supported
    /// algorithm; kept for API symmetry with `Vec::is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parses a digest from a lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        hex::decode(s)
            .map(Digest)
            .map_err(|e| DigestError::InvalidHex(e.to_string()))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(D::Error::custom)
    }
}
