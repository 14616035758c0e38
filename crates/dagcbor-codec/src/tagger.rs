//! Link tagging.
//!
//! Every embedded link is written as CBOR tag 42 around a byte string:
//! one `0x00` prefix byte (the identity multibase, meaning "raw binary,
//! no further decoding") followed by the link's binary CID.

use dagcbor_types::{DagNode, Link, LinkValue};

use crate::error::{CodecError, CodecResult};

/// CBOR tag number registered for content identifiers.
pub const LINK_TAG: u64 = 42;

/// Multibase prefix marking the payload as raw binary.
pub const IDENTITY_PREFIX: u8 = 0x00;

/// A link in its tagged wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedLink {
    tag: u64,
    payload: Vec<u8>,
}

impl TaggedLink {
    /// The CBOR tag number.
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// The tagged byte string: prefix byte, then the binary CID.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The binary CID inside the payload, without the prefix byte.
    pub fn cid_bytes(&self) -> &[u8] {
        self.payload.get(1..).unwrap_or_default()
    }
}

/// Converts link values into [`TaggedLink`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkTagger;

impl LinkTagger {
    /// Tag a link slot, parsing textual identifiers first.
    pub fn tag(&self, value: &LinkValue) -> CodecResult<TaggedLink> {
        match value {
            LinkValue::Cid(link) => Ok(Self::tag_link(link)),
            LinkValue::Text(text) => Ok(Self::tag_link(&Link::parse(text)?)),
        }
    }

    /// Tag an arbitrary node that must resolve to a link: a link node or a
    /// text node holding an identifier.
    pub fn tag_node(&self, node: &DagNode) -> CodecResult<TaggedLink> {
        match node {
            DagNode::Link(value) => self.tag(value),
            DagNode::Text(text) => Ok(Self::tag_link(&Link::parse(text)?)),
            other => Err(CodecError::InvalidLink(format!(
                "expected a link or identifier text, got {}",
                other.kind()
            ))),
        }
    }

    /// Tag an already-parsed link.
    pub fn tag_link(link: &Link) -> TaggedLink {
        let cid = link.to_bytes();
        let mut payload = Vec::with_capacity(1 + cid.len());
        payload.push(IDENTITY_PREFIX);
        payload.extend_from_slice(&cid);
        TaggedLink {
            tag: LINK_TAG,
            payload,
        }
    }
}
