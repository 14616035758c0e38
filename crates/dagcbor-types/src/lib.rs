//! Foundation types for DAG-CBOR blocks.
//!
//! This crate provides the data model that the codec crates consume: the
//! content identifier type and the in-memory tree of one block.
//!
//! # Key Types
//!
//! - [`Link`] — Content identifier (CID) referencing another block
//! - [`LinkValue`] — A link slot: parsed [`Link`] or its text form
//! - [`DagNode`] — One value in a block tree
//! - [`DagList`] / [`DagMap`] — Shared containers identified by [`ContainerId`]

pub mod error;
pub mod json;
pub mod link;
pub mod node;

pub use error::{TypeError, TypeResult};
pub use json::{BYTES_KEY, LINK_KEY};
pub use link::Link;
pub use node::{ContainerId, DagList, DagMap, DagNode, LinkValue};

// Re-exported so callers can build links without a direct dependency.
pub use multihash::Multihash;
