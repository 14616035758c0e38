//! Link substitution over a block tree.
//!
//! [`TreeTransformer`] rewrites a [`DagNode`] into a [`TransformedNode`]:
//! the same shape, with every link replaced by its [`TaggedLink`]. The walk
//! keeps its own frame stack instead of recursing, so nesting depth is
//! bounded by heap, not call stack.
//!
//! # Rules
//!
//! - Null, booleans, numbers, text and bytes are leaves: returned as-is.
//! - Lists become new lists of transformed elements, same order and length.
//! - Links become tagged links.
//! - Maps become new maps in key insertion order. Scalar values are copied
//!   without descending. An empty map is returned as the same reference.

use std::collections::HashSet;
use std::mem;

use dagcbor_types::{ContainerId, DagNode};
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::tagger::{LinkTagger, TaggedLink};

/// A block tree with links replaced by their tagged form.
///
/// Leaves share storage with the input tree.
#[derive(Clone, Debug)]
pub enum TransformedNode {
    /// A value passed through unchanged: a scalar, text, bytes, or an
    /// empty map.
    Leaf(DagNode),
    List(Vec<TransformedNode>),
    Map(Vec<(String, TransformedNode)>),
    Link(TaggedLink),
}

impl TransformedNode {
    /// Number of tagged links anywhere in the tree.
    pub fn link_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                TransformedNode::Leaf(_) => {}
                TransformedNode::Link(_) => count += 1,
                TransformedNode::List(items) => pending.extend(items.iter()),
                TransformedNode::Map(entries) => pending.extend(entries.iter().map(|(_, v)| v)),
            }
        }
        count
    }
}

// Children are detached and dropped from a flat queue so that tearing down
// a deep tree does not recurse once per level.
impl Drop for TransformedNode {
    fn drop(&mut self) {
        let mut pending = match self {
            TransformedNode::List(items) => mem::take(items),
            TransformedNode::Map(entries) => mem::take(entries).into_iter().map(|(_, v)| v).collect(),
            _ => return,
        };
        while let Some(mut node) = pending.pop() {
            match &mut node {
                TransformedNode::List(items) => pending.append(items),
                TransformedNode::Map(entries) => {
                    pending.extend(mem::take(entries).into_iter().map(|(_, v)| v))
                }
                _ => {}
            }
        }
    }
}

/// One container being rebuilt.
enum Frame {
    List {
        id: ContainerId,
        pending: std::vec::IntoIter<DagNode>,
        out: Vec<TransformedNode>,
    },
    Map {
        id: ContainerId,
        pending: std::vec::IntoIter<(String, DagNode)>,
        key: Option<String>,
        out: Vec<(String, TransformedNode)>,
    },
}

impl Frame {
    fn id(&self) -> ContainerId {
        match self {
            Frame::List { id, .. } | Frame::Map { id, .. } => *id,
        }
    }

    /// Next child that needs a visit. Scalar map values are copied straight
    /// into the output here.
    fn next_child(&mut self) -> Option<DagNode> {
        match self {
            Frame::List { pending, .. } => pending.next(),
            Frame::Map {
                pending, key, out, ..
            } => {
                for (k, value) in pending.by_ref() {
                    if value.is_container_or_link() {
                        *key = Some(k);
                        return Some(value);
                    }
                    out.push((k, TransformedNode::Leaf(value)));
                }
                None
            }
        }
    }

    fn accept(&mut self, value: TransformedNode) {
        match self {
            Frame::List { out, .. } => out.push(value),
            Frame::Map { key, out, .. } => {
                if let Some(k) = key.take() {
                    out.push((k, value));
                }
            }
        }
    }

    fn finish(self) -> TransformedNode {
        match self {
            Frame::List { out, .. } => TransformedNode::List(out),
            Frame::Map { out, .. } => TransformedNode::Map(out),
        }
    }
}

/// Rewrites block trees, tagging every embedded link.
#[derive(Clone, Debug, Default)]
pub struct TreeTransformer {
    tagger: LinkTagger,
    max_depth: Option<usize>,
}

impl TreeTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit container nesting. `None` disables the limit.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Transform `root`.
    ///
    /// The input is never modified. A container that appears inside itself
    /// fails with [`CodecError::CircularReference`]; link tagging failures
    /// propagate unchanged.
    pub fn transform(&self, root: &DagNode) -> CodecResult<TransformedNode> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut on_path: HashSet<ContainerId> = HashSet::new();

        let mut ready = self.step(root, &mut stack, &mut on_path)?;
        while let Some(frame) = stack.last_mut() {
            if let Some(done) = ready.take() {
                frame.accept(done);
            }
            match frame.next_child() {
                Some(child) => ready = self.step(&child, &mut stack, &mut on_path)?,
                None => {
                    if let Some(frame) = stack.pop() {
                        on_path.remove(&frame.id());
                        ready = Some(frame.finish());
                    }
                }
            }
        }

        ready.ok_or_else(|| CodecError::Traversal("walk ended without a result".into()))
    }

    /// Visit one node: leaves and links resolve immediately, non-empty
    /// containers push a frame and resolve later.
    fn step(
        &self,
        node: &DagNode,
        stack: &mut Vec<Frame>,
        on_path: &mut HashSet<ContainerId>,
    ) -> CodecResult<Option<TransformedNode>> {
        match node {
            DagNode::Null
            | DagNode::Bool(_)
            | DagNode::Integer(_)
            | DagNode::Float(_)
            | DagNode::Text(_)
            | DagNode::Bytes(_) => Ok(Some(TransformedNode::Leaf(node.clone()))),
            DagNode::Link(_) => Ok(Some(TransformedNode::Link(self.tagger.tag_node(node)?))),
            DagNode::List(list) => {
                let id = list.id();
                self.check_entry(id, stack.len(), on_path)?;
                let items = list.snapshot().map_err(CodecError::traversal)?;
                trace!(container = ?id, len = items.len(), "entering list");
                on_path.insert(id);
                stack.push(Frame::List {
                    id,
                    out: Vec::with_capacity(items.len()),
                    pending: items.into_iter(),
                });
                Ok(None)
            }
            DagNode::Map(map) => {
                let id = map.id();
                self.check_entry(id, stack.len(), on_path)?;
                let entries = map.snapshot().map_err(CodecError::traversal)?;
                if entries.is_empty() {
                    return Ok(Some(TransformedNode::Leaf(node.clone())));
                }
                trace!(container = ?id, len = entries.len(), "entering map");
                on_path.insert(id);
                stack.push(Frame::Map {
                    id,
                    key: None,
                    out: Vec::with_capacity(entries.len()),
                    pending: entries.into_iter(),
                });
                Ok(None)
            }
        }
    }

    fn check_entry(
        &self,
        id: ContainerId,
        depth: usize,
        on_path: &HashSet<ContainerId>,
    ) -> CodecResult<()> {
        if on_path.contains(&id) {
            return Err(CodecError::CircularReference);
        }
        match self.max_depth {
            Some(limit) if depth >= limit => Err(CodecError::DepthExceeded { limit }),
            _ => Ok(()),
        }
    }
}
