//! Block serialization pipeline.
//!
//! [`Serializer::serialize`] runs three stages, each fail-fast:
//!
//! 1. [`CycleDetector`] rejects cyclic graphs before any other work.
//! 2. [`TreeTransformer`] replaces every link with its tagged form.
//! 3. The [`BlockEncoder`] writes the result.
//!
//! Errors from each stage are returned unchanged and no partial output is
//! ever produced.

use dagcbor_crypto::BlockHasher;
use dagcbor_types::{DagNode, Link, TypeError};
use tracing::debug;

use crate::block::Block;
use crate::config::SerializerConfig;
use crate::cycle::CycleDetector;
use crate::encoder::{BlockEncoder, CborEncoder};
use crate::error::{CodecError, CodecResult};
use crate::transform::TreeTransformer;

/// Serializes block trees into encoded bytes.
#[derive(Clone, Debug)]
pub struct Serializer<E = CborEncoder> {
    config: SerializerConfig,
    detector: CycleDetector,
    transformer: TreeTransformer,
    encoder: E,
}

impl Serializer<CborEncoder> {
    /// A CBOR serializer configured by `config`.
    pub fn new(config: SerializerConfig) -> Self {
        let encoder = CborEncoder::new(config.key_order);
        Self::with_encoder(config, encoder)
    }
}

impl Default for Serializer<CborEncoder> {
    fn default() -> Self {
        Self::new(SerializerConfig::default())
    }
}

impl<E: BlockEncoder> Serializer<E> {
    /// A serializer writing through a custom encoder.
    pub fn with_encoder(config: SerializerConfig, encoder: E) -> Self {
        let transformer = TreeTransformer::new().with_max_depth(config.max_depth);
        Self {
            config,
            detector: CycleDetector,
            transformer,
            encoder,
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Encode one block tree.
    pub fn serialize(&self, node: &DagNode) -> CodecResult<Vec<u8>> {
        self.detector.ensure_acyclic(node)?;
        let tagged = self.transformer.transform(node)?;
        let bytes = self.encoder.encode(&tagged)?;
        debug!(bytes = bytes.len(), links = tagged.link_count(), "serialized block");
        Ok(bytes)
    }

    /// Ingest a DAG-JSON value and encode it.
    pub fn serialize_json(&self, value: &serde_json::Value) -> CodecResult<Vec<u8>> {
        let node = DagNode::from_json(value).map_err(|e| match e {
            TypeError::InvalidLink(reason) => CodecError::InvalidLink(reason),
            TypeError::InvalidBytes(reason) => CodecError::Encoding(reason),
            other => CodecError::LinkParse(other),
        })?;
        self.serialize(&node)
    }

    /// Encode one block tree and derive its DAG-CBOR link.
    pub fn encode_block(&self, node: &DagNode, hasher: &BlockHasher) -> CodecResult<Block> {
        let bytes = self.serialize(node)?;
        let link = hasher
            .link(Link::DAG_CBOR, &bytes)
            .map_err(|e| CodecError::Encoding(e.to_string()))?;
        debug!(link = %link, bytes = bytes.len(), "encoded block");
        Ok(Block::new(link, bytes))
    }
}

/// Encode one block tree with the default configuration.
pub fn serialize(node: &DagNode) -> CodecResult<Vec<u8>> {
    Serializer::default().serialize(node)
}
