use std::fmt;
use std::str::FromStr;

use cid::Cid;
use multihash::Multihash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Content identifier linking one block to another.
///
/// A `Link` wraps a CID: a self-describing identifier carrying a version,
/// a content codec, and a multihash of the referenced block. Links are
/// immutable leaves of a block tree and are never traversed into.
///
/// # String form
///
/// Multibase text (base32-lower `"bafy..."` for CIDv1, base58btc `"Qm..."`
/// for CIDv0). Used in JSON and logs.
///
/// # Binary form
///
/// Standard CID binary: varint(version) + varint(codec) + multihash.
/// This is the form embedded in encoded blocks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(Cid);

impl Link {
    /// Multicodec for DAG-CBOR blocks.
    pub const DAG_CBOR: u64 = 0x71;
    /// Multicodec for DAG-JSON blocks.
    pub const DAG_JSON: u64 = 0x0129;
    /// Multicodec for raw binary blocks.
    pub const RAW: u64 = 0x55;

    /// Build a CIDv1 link from a codec and a multihash.
    pub fn new_v1(codec: u64, hash: Multihash<64>) -> Self {
        Self(Cid::new_v1(codec, hash))
    }

    /// Wrap an existing `Cid`.
    pub fn from_cid(cid: Cid) -> Self {
        Self(cid)
    }

    /// Borrow the inner `Cid`.
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }

    /// The multicodec of the referenced block.
    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// The CID version (0 or 1).
    pub fn version(&self) -> u64 {
        self.0.version().into()
    }

    /// Canonical binary representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Parse from the canonical binary representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let cid = Cid::try_from(bytes).map_err(|e| TypeError::InvalidCid(e.to_string()))?;
        Ok(Self(cid))
    }

    /// Parse from any supported text form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let cid = Cid::try_from(s).map_err(|e| TypeError::InvalidCid(format!("{s:?}: {e}")))?;
        Ok(Self(cid))
    }

    /// Short hex of the binary form (first 8 characters), for log fields.
    pub fn short_hex(&self) -> String {
        let bytes = self.to_bytes();
        hex::encode(&bytes[..bytes.len().min(4)])
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Link {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Cid> for Link {
    fn from(cid: Cid) -> Self {
        Self(cid)
    }
}

impl From<Link> for Cid {
    fn from(link: Link) -> Self {
        link.0
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
