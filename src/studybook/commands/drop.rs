//! # Drop Handling
//!
//! A drag-and-drop gesture ends with two ids: `active` (the node being dragged) and
//! `over` (the node it was released on). [`plan_drop`] decides what that means, and
//! [`apply_plan`] writes it.
//!
//! | Situation | Plan |
//! |-----------|------|
//! | same node, or either id unknown | `Noop` |
//! | `over` is `active` or inside its subtree | `Reject` |
//! | `over` is the folder that already holds `active` | `Noop` |
//! | `over` is any other folder | `Reparent`: append inside `over` |
//! | `active` already sits right before its sibling `over` | `Noop` |
//! | `active` and `over` are siblings | `Reorder`: place `active` right before `over` |
//! | otherwise | `Insert`: move next to `over`, taking its slot |
//!
//! Every plan lands `active` in a spot that the same `(active, over)` pair maps to
//! `Noop`, so a retried drop event leaves the tree as the first one did. Plans carry
//! absolute `(parent, order)` assignments rather than deltas, and applying one twice
//! writes nothing the second time.
//!
//! Mid-gesture effects (auto-expanding a folder while hovering) never touch the store;
//! see [`crate::gesture`].

use super::guard::{is_descendant, parent_map};
use crate::error::Result;
use crate::model::{Node, Parent};
use crate::store::DataStore;
use crate::tree::{max_child_order, sibling_order};
use tracing::{debug, info};
use uuid::Uuid;

/// Target placement of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeUpdate {
    pub id: Uuid,
    pub parent: Parent,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    Noop,
    Reject,
    Reparent(NodeUpdate),
    Reorder(Vec<NodeUpdate>),
    Insert(Vec<NodeUpdate>),
}

impl DropPlan {
    pub fn updates(&self) -> &[NodeUpdate] {
        match self {
            DropPlan::Noop | DropPlan::Reject => &[],
            DropPlan::Reparent(update) => std::slice::from_ref(update),
            DropPlan::Reorder(updates) | DropPlan::Insert(updates) => updates,
        }
    }
}

pub fn plan_drop(nodes: &[Node], active: Uuid, over: Uuid, max_depth: usize) -> DropPlan {
    if active == over {
        return DropPlan::Noop;
    }
    let (Some(active_node), Some(over_node)) = (
        nodes.iter().find(|n| n.id == active),
        nodes.iter().find(|n| n.id == over),
    ) else {
        return DropPlan::Noop;
    };

    let parents = parent_map(nodes);
    if is_descendant(|id| parents.get(&id).copied(), active, over, max_depth) {
        debug!(%active, %over, "drop rejected: target is inside the dragged subtree");
        return DropPlan::Reject;
    }

    let into_folder = Parent::Node(over);
    if over_node.is_folder() {
        if active_node.parent_id == into_folder {
            debug!(%active, %over, "already inside the target folder");
            return DropPlan::Noop;
        }
        let order = max_child_order(nodes, into_folder).map_or(0, |max| max.saturating_add(1));
        let update = NodeUpdate {
            id: active,
            parent: into_folder,
            order,
        };
        debug!(?update, "drop into folder");
        return DropPlan::Reparent(update);
    }

    let target_parent = over_node.parent_id;
    let mut group: Vec<&Node> = nodes
        .iter()
        .filter(|n| n.parent_id == target_parent)
        .collect();
    group.sort_by(|a, b| sibling_order(a, b));

    if active_node.parent_id == target_parent {
        let Some(from) = group.iter().position(|n| n.id == active) else {
            return DropPlan::Noop;
        };
        if group.get(from + 1).map(|n| n.id) == Some(over) {
            return DropPlan::Noop;
        }
        let moved = group.remove(from);
        let Some(to) = group.iter().position(|n| n.id == over) else {
            return DropPlan::Noop;
        };
        group.insert(to, moved);

        let updates = renumber(&group, target_parent, None);
        debug!(count = updates.len(), "reorder within sibling group");
        if updates.is_empty() {
            return DropPlan::Noop;
        }
        return DropPlan::Reorder(updates);
    }

    let Some(at) = group.iter().position(|n| n.id == over) else {
        return DropPlan::Noop;
    };
    group.insert(at, active_node);

    let updates = renumber(&group, target_parent, Some(active));
    debug!(count = updates.len(), "insert next to sibling in another group");
    DropPlan::Insert(updates)
}

/// Assigns `0..n` in slice order, keeping only the nodes whose placement changes.
fn renumber(group: &[&Node], parent: Parent, moved: Option<Uuid>) -> Vec<NodeUpdate> {
    group
        .iter()
        .enumerate()
        .filter(|(i, n)| n.order != *i as i64 || Some(n.id) == moved)
        .map(|(i, n)| NodeUpdate {
            id: n.id,
            parent,
            order: i as i64,
        })
        .collect()
}

/// Writes a plan, one `update_node` per node whose stored placement differs.
///
/// Returns the number of nodes written.
pub fn apply_plan<S: DataStore>(store: &mut S, plan: &DropPlan) -> Result<usize> {
    let mut written = 0;
    for update in plan.updates() {
        let mut node = store.get_node(&update.id)?;
        if node.parent_id == update.parent && node.order == update.order {
            continue;
        }
        node.parent_id = update.parent;
        node.order = update.order;
        store.update_node(&node)?;
        written += 1;
    }
    if written > 0 {
        info!(written, "applied drop");
    }
    Ok(written)
}

/// Plans and applies a drop against the current store contents.
pub fn run<S: DataStore>(
    store: &mut S,
    active: Uuid,
    over: Uuid,
    max_depth: usize,
) -> Result<DropPlan> {
    let nodes = store.list_nodes()?;
    let plan = plan_drop(&nodes, active, over, max_depth);
    apply_plan(store, &plan)?;
    Ok(plan)
}
