//! Shared fixtures for unit tests.

use dagcbor_crypto::BlockHasher;
use dagcbor_types::{DagNode, Link};

/// A deterministic link derived from `seed`.
pub fn sample_link(seed: &str) -> Link {
    BlockHasher::SHA2_256
        .link(Link::DAG_CBOR, seed.as_bytes())
        .unwrap()
}

/// A list nested `depth` levels deep around `leaf`.
pub fn nested_lists(depth: usize, leaf: DagNode) -> DagNode {
    let mut node = leaf;
    for _ in 0..depth {
        node = DagNode::list([node]);
    }
    node
}
