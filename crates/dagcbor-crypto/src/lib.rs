//! Block hashing for DAG-CBOR.
//!
//! Derives the [`Link`](dagcbor_types::Link) that addresses an encoded
//! block: the block bytes are digested, wrapped as a multihash, and
//! combined with a content codec into a CIDv1.
//!
//! All hashing wraps established libraries — no custom cryptography.

pub mod hasher;

pub use hasher::BlockHasher;
