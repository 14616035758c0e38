//! DAG-CBOR block serialization.
//!
//! Converts an in-memory block tree into its canonical CBOR encoding. Every
//! link embedded anywhere in the tree is written as CBOR tag 42 around a
//! byte string holding `0x00` followed by the link's binary CID. Cyclic
//! graphs are rejected before any work is done, and every traversal uses
//! an explicit stack so arbitrarily deep trees are safe to encode.
//!
//! # Quick Start
//!
//! ```rust
//! use dagcbor_codec::{serialize, Serializer, SerializerConfig};
//! use dagcbor_crypto::BlockHasher;
//! use dagcbor_types::{DagNode, Link};
//!
//! let target = BlockHasher::SHA2_256.link(Link::RAW, b"payload").unwrap();
//! let node = DagNode::map([
//!     ("name", DagNode::from("example")),
//!     ("data", DagNode::link(target)),
//! ]);
//!
//! let bytes = serialize(&node).unwrap();
//! assert_eq!(bytes[0], 0xa2); // map with two entries
//!
//! let block = Serializer::new(SerializerConfig::default())
//!     .encode_block(&node, &BlockHasher::SHA2_256)
//!     .unwrap();
//! assert_eq!(block.bytes(), bytes.as_slice());
//! ```

pub mod block;
pub mod config;
pub mod cycle;
pub mod encoder;
pub mod error;
pub mod serializer;
pub mod tagger;
pub mod transform;

#[cfg(test)]
mod test_support;

// Re-exports for convenience.
pub use block::Block;
pub use config::{KeyOrder, SerializerConfig};
pub use cycle::CycleDetector;
pub use encoder::{BlockEncoder, CborEncoder};
pub use error::{CodecError, CodecResult};
pub use serializer::{serialize, Serializer};
pub use tagger::{LinkTagger, TaggedLink, IDENTITY_PREFIX, LINK_TAG};
pub use transform::{TransformedNode, TreeTransformer};
