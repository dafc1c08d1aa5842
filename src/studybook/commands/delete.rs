use super::helpers::{node_tree, resolve_selectors};
use super::{CmdMessage, CmdResult, DisplayNode};
use crate::error::{Result, StudyError};
use crate::index::{fmt_path, NodeSelector};
use crate::model::Parent;
use crate::store::DataStore;
use crate::tree::find;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Bounds for recursive walks over stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    pub max_depth: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self { max_depth: 500 }
    }
}

/// Preview of what a delete would remove.
/// Used by the CLI to show confirmation before executing.
#[derive(Debug)]
pub struct DeletePreview {
    /// Nodes directly targeted, each with the number of nodes below it.
    pub targets: Vec<(DisplayNode, usize)>,
}

impl DeletePreview {
    pub fn total(&self) -> usize {
        self.targets.iter().map(|(_, below)| below + 1).sum()
    }
}

pub fn preview<S: DataStore>(store: &S, selectors: &[NodeSelector]) -> Result<DeletePreview> {
    let resolved = resolve_selectors(store, selectors)?;
    let roots = node_tree(store)?;

    let mut targets = Vec::with_capacity(resolved.len());
    for (path, id) in resolved {
        let Some(tn) = find(&roots, id) else {
            continue;
        };
        targets.push((
            DisplayNode::flat(tn.node.clone(), path),
            tn.descendant_count(),
        ));
    }
    Ok(DeletePreview { targets })
}

/// Deletes `id` and everything below it, children first.
///
/// A failure anywhere below stops the walk before the node above it is touched, so a
/// parent is never removed while children remain. Returns the number of nodes deleted.
pub fn delete_recursive<S: DataStore>(store: &mut S, id: Uuid, limits: WalkLimits) -> Result<usize> {
    let mut visited = HashSet::new();
    let deleted = delete_walk(store, id, 0, limits, &mut visited)?;
    info!(node = %id, deleted, "deleted subtree");
    Ok(deleted)
}

fn delete_walk<S: DataStore>(
    store: &mut S,
    id: Uuid,
    depth: usize,
    limits: WalkLimits,
    visited: &mut HashSet<Uuid>,
) -> Result<usize> {
    if depth > limits.max_depth {
        warn!(node = %id, depth, "delete walk exceeded depth bound");
        return Err(StudyError::CorruptTree(format!(
            "subtree below {} is deeper than {} levels",
            id, limits.max_depth
        )));
    }
    if !visited.insert(id) {
        warn!(node = %id, "delete walk found a parent cycle");
        return Err(StudyError::CorruptTree(format!(
            "node {} is its own ancestor",
            id
        )));
    }

    let mut deleted = 0;
    for child in store.children_of(Parent::Node(id))? {
        deleted += delete_walk(store, child.id, depth + 1, limits, visited)?;
    }
    store.delete_node(&id)?;
    Ok(deleted + 1)
}

/// Deletes each selected node with its subtree, one after another.
///
/// **Important**: This function does NOT prompt for confirmation. The CLI layer should
/// call `preview()` first, show confirmation to the user, then call this function.
pub fn run<S: DataStore>(
    store: &mut S,
    selectors: &[NodeSelector],
    limits: WalkLimits,
) -> Result<CmdResult> {
    let resolved = resolve_selectors(store, selectors)?;
    let mut result = CmdResult::default();

    for (path, id) in resolved {
        // An earlier target may have been this node's ancestor
        let node = match store.get_node(&id) {
            Ok(node) => node,
            Err(StudyError::NodeNotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        let deleted = delete_recursive(store, id, limits)?;

        let below = deleted - 1;
        let message = if below > 0 {
            format!(
                "Deleted {} {} and {} note(s) inside it",
                fmt_path(&path),
                node.title,
                below
            )
        } else {
            format!("Deleted {} {}", fmt_path(&path), node.title)
        };
        result.add_message(CmdMessage::success(message));
        result.affected_nodes.push(DisplayNode::flat(node, path));
    }

    Ok(result)
}
