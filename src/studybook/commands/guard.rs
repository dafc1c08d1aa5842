//! Cycle guard for re-parenting.
//!
//! Before a node is moved under a new parent, the new parent must not be the node
//! itself or anything below it. The check walks parent references upward from the
//! candidate. The walk is bounded so that already-corrupt data (a parent cycle that
//! does not pass through the source) cannot hang it.

use crate::model::{Node, Parent};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// True when `candidate` is `source` or lies in `source`'s subtree.
///
/// `lookup` returns a node's parent reference, or `None` for an unknown id. The walk
/// stops with `false` at the root, at an unknown id, or after `max_depth` hops.
pub fn is_descendant<F>(lookup: F, source: Uuid, candidate: Uuid, max_depth: usize) -> bool
where
    F: Fn(Uuid) -> Option<Parent>,
{
    if candidate == source {
        return true;
    }

    let mut current = candidate;
    for _ in 0..max_depth {
        match lookup(current) {
            None | Some(Parent::Root) => return false,
            Some(Parent::Node(parent)) => {
                if parent == source {
                    return true;
                }
                current = parent;
            }
        }
    }

    warn!(%source, %candidate, max_depth, "ancestor walk hit the depth bound");
    false
}

/// Parent lookup table for [`is_descendant`].
pub fn parent_map(nodes: &[Node]) -> HashMap<Uuid, Parent> {
    nodes.iter().map(|n| (n.id, n.parent_id)).collect()
}

/// Convenience wrapper: may `source` be placed under `target`?
pub fn can_reparent(nodes: &[Node], source: Uuid, target: Parent, max_depth: usize) -> bool {
    match target {
        Parent::Root => true,
        Parent::Node(target_id) => {
            let parents = parent_map(nodes);
            !is_descendant(|id| parents.get(&id).copied(), source, target_id, max_depth)
        }
    }
}
