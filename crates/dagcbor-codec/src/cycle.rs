//! Cycle detection over container identity.
//!
//! Edges are list elements and map values; two handles to the same
//! container are the same vertex. A container reached twice along
//! different paths (a diamond) is shared, not cyclic.

use std::collections::HashSet;

use dagcbor_types::{ContainerId, DagNode};
use tracing::trace;

use crate::error::{CodecError, CodecResult};

enum Visit {
    Enter(DagNode),
    Exit(ContainerId),
}

/// Detects cycles reachable from a root node.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleDetector;

impl CycleDetector {
    /// Returns `true` if a container can reach itself.
    ///
    /// The walk uses an explicit stack, so deep trees do not consume call
    /// stack. A container that cannot be read fails the check with
    /// [`CodecError::Traversal`].
    pub fn has_cycle(&self, root: &DagNode) -> CodecResult<bool> {
        let mut stack = vec![Visit::Enter(root.clone())];
        let mut on_path: HashSet<ContainerId> = HashSet::new();
        let mut finished: HashSet<ContainerId> = HashSet::new();

        while let Some(visit) = stack.pop() {
            let node = match visit {
                Visit::Exit(id) => {
                    on_path.remove(&id);
                    finished.insert(id);
                    continue;
                }
                Visit::Enter(node) => node,
            };

            let (id, children) = match &node {
                DagNode::List(list) => (list.id(), list.snapshot().map_err(CodecError::traversal)?),
                DagNode::Map(map) => (
                    map.id(),
                    map.snapshot()
                        .map_err(CodecError::traversal)?
                        .into_iter()
                        .map(|(_, v)| v)
                        .collect(),
                ),
                _ => continue,
            };

            if finished.contains(&id) {
                continue;
            }
            if !on_path.insert(id) {
                trace!(container = ?id, "cycle found");
                return Ok(true);
            }

            stack.push(Visit::Exit(id));
            for child in children.into_iter().rev() {
                if matches!(child, DagNode::List(_) | DagNode::Map(_)) {
                    stack.push(Visit::Enter(child));
                }
            }
        }

        Ok(false)
    }

    /// Fails with [`CodecError::CircularReference`] if the graph is cyclic.
    pub fn ensure_acyclic(&self, root: &DagNode) -> CodecResult<()> {
        if self.has_cycle(root)? {
            return Err(CodecError::CircularReference);
        }
        Ok(())
    }
}
