use dagcbor_types::Link;

/// An encoded block together with the link that addresses it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    link: Link,
    bytes: Vec<u8>,
}

impl Block {
    pub(crate) fn new(link: Link, bytes: Vec<u8>) -> Self {
        Self { link, bytes }
    }

    /// CIDv1 of the encoded bytes.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
