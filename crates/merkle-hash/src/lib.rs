//! Domain-separated hashing primitives shared by the append-only Merkle
//! tree implementation in `merkle-log`.
//!
//! The hashing discipline follows RFC 9162 ("Sakura"): leaves are hashed
//! with a `0x00` prefix and interior pairs with a `0x01` prefix whenever
//! second-preimage resistance (`security`) is enabled. The hash algorithm
//! itself is a runtime choice rather than a type parameter, so that a tree
//! can be constructed from a configuration string (`"sha256"`, `"sha3_512"`,
//! ...) without recompiling against a different digest type.

#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications, missing_docs)]
#![warn(clippy::all, clippy::panic)]
#![forbid(unsafe_code, clippy::expect_used)]

mod algorithm;
mod digest;
mod hasher;

pub use algorithm::{HashAlgorithm, UnsupportedAlgorithm};
pub use digest::Digest;
pub use hasher::Hasher;
