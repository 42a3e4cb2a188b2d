//! An append-only Merkle hash tree with inclusion and consistency proofs,
//! compatible in spirit with RFC 9162 ("Sakura" / Certificate Transparency)
//! semantics.
//!
//! The tree is generic over a [`LeafLog`] storage backend; this crate
//! ships an in-memory one and defines the contract a SQL-backed or other
//! durable backend must satisfy. Hashing is handled by `merkle-hash`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications, missing_docs)]
#![warn(clippy::all, clippy::panic)]
#![forbid(unsafe_code, clippy::expect_used)]

mod cache;
mod consistency;
mod error;
mod inclusion;
mod proof;
mod range;
mod storage;
mod tree;
mod verify;

pub use cache::CacheStats;
pub use error::{InvalidChallenge, InvalidProof, StorageError, TreeError};
pub use proof::Proof;
pub use storage::{InMemoryLog, LeafLog};
pub use tree::{MerkleTree, TreeConfig};
pub use verify::{consistency_roots, verify_consistency, verify_inclusion, ConsistencyRoots};

pub use merkle_hash::{HashAlgorithm, UnsupportedAlgorithm};
