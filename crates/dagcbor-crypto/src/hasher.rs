use dagcbor_types::{Link, Multihash, TypeError};
use sha2::Digest;

/// Multihash-producing block hasher.
///
/// Each hasher carries the multihash code of its digest function, which is
/// recorded inside every link it produces so that readers know how to
/// re-derive the hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHasher {
    code: u64,
}

impl BlockHasher {
    /// SHA2-256, the default for DAG-CBOR blocks.
    pub const SHA2_256: Self = Self { code: 0x12 };
    /// BLAKE3 with a 32-byte output.
    pub const BLAKE3: Self = Self { code: 0x1e };

    /// The multihash code recorded in produced links.
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Raw 32-byte digest of `data`.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        match self.code {
            0x1e => *blake3::hash(data).as_bytes(),
            _ => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&sha2::Sha256::digest(data));
                out
            }
        }
    }

    /// Digest wrapped as a multihash.
    pub fn multihash(&self, data: &[u8]) -> Result<Multihash<64>, TypeError> {
        Multihash::wrap(self.code, &self.digest(data))
            .map_err(|e| TypeError::InvalidMultihash(e.to_string()))
    }

    /// CIDv1 link addressing `data` under the given content codec.
    pub fn link(&self, codec: u64, data: &[u8]) -> Result<Link, TypeError> {
        Ok(Link::new_v1(codec, self.multihash(data)?))
    }
}

impl Default for BlockHasher {
    fn default() -> Self {
        Self::SHA2_256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_deterministic() {
        let a = BlockHasher::SHA2_256.link(Link::DAG_CBOR, b"block").unwrap();
        let b = BlockHasher::SHA2_256.link(Link::DAG_CBOR, b"block").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_hashers_produce_different_links() {
        let sha = BlockHasher::SHA2_256.link(Link::DAG_CBOR, b"same").unwrap();
        let b3 = BlockHasher::BLAKE3.link(Link::DAG_CBOR, b"same").unwrap();
        assert_ne!(sha, b3);
    }

    #[test]
    fn link_records_codec_and_hash_code() {
        let link = BlockHasher::BLAKE3.link(Link::RAW, b"data").unwrap();
        assert_eq!(link.version(), 1);
        assert_eq!(link.codec(), Link::RAW);
        assert_eq!(link.as_cid().hash().code(), 0x1e);
        assert_eq!(link.as_cid().hash().digest(), blake3::hash(b"data").as_bytes());
    }

    #[test]
    fn sha256_of_empty_input() {
        let digest = BlockHasher::SHA2_256.digest(b"");
        assert_eq!(
            digest[..4],
            [0xe3, 0xb0, 0xc4, 0x42],
            "well-known SHA-256 of the empty string"
        );
    }

    #[test]
    fn default_is_sha256() {
        assert_eq!(BlockHasher::default(), BlockHasher::SHA2_256);
        assert_eq!(BlockHasher::default().code(), 0x12);
    }
}
