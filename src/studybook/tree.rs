//! # Tree Builder
//!
//! Nodes are stored flat, each pointing at its parent. [`build_tree`] turns that flat
//! collection into the nested shape the UI renders:
//!
//! - Children are grouped by `parent_id` and sorted ascending by `order`
//!   (ties fall back to `created_at`, then id, so the result is deterministic).
//! - Nodes whose parent does not exist are unreachable and simply left out.
//! - A node is emitted at most once, so even a corrupted collection containing a
//!   parent cycle produces a finite tree.
//!
//! The builder is pure: it borrows the input and clones what it nests.

use crate::model::{Node, Parent};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> Uuid {
        self.node.id
    }

    /// Number of nodes below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Ids of this node and everything below it, parents before children.
    pub fn subtree_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.node.id];
        for child in &self.children {
            ids.extend(child.subtree_ids());
        }
        ids
    }
}

/// Sibling ordering: `order`, then creation time, then id.
pub fn sibling_order(a: &Node, b: &Node) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_siblings(nodes: &mut [Node]) {
    nodes.sort_by(sibling_order);
}

/// Nests `nodes` below `parent`, sorted by sibling order at every level.
pub fn build_tree(nodes: &[Node], parent: Parent) -> Vec<TreeNode> {
    let mut by_parent: HashMap<Parent, Vec<&Node>> = HashMap::new();
    for node in nodes {
        by_parent.entry(node.parent_id).or_default().push(node);
    }
    for group in by_parent.values_mut() {
        group.sort_by(|a, b| sibling_order(a, b));
    }

    let mut visited = HashSet::new();
    if let Some(id) = parent.id() {
        visited.insert(id);
    }
    nest(parent, &by_parent, &mut visited)
}

fn nest(
    parent: Parent,
    by_parent: &HashMap<Parent, Vec<&Node>>,
    visited: &mut HashSet<Uuid>,
) -> Vec<TreeNode> {
    let Some(group) = by_parent.get(&parent) else {
        return Vec::new();
    };

    let mut level = Vec::with_capacity(group.len());
    for node in group {
        if !visited.insert(node.id) {
            continue;
        }
        let children = nest(Parent::Node(node.id), by_parent, visited);
        level.push(TreeNode {
            node: (*node).clone(),
            children,
        });
    }
    level
}

/// Depth-first search for a node anywhere in the forest.
pub fn find(roots: &[TreeNode], id: Uuid) -> Option<&TreeNode> {
    for tn in roots {
        if tn.node.id == id {
            return Some(tn);
        }
        if let Some(found) = find(&tn.children, id) {
            return Some(found);
        }
    }
    None
}

/// Ids reachable from the root sentinel.
pub fn reachable_ids(nodes: &[Node]) -> HashSet<Uuid> {
    build_tree(nodes, Parent::Root)
        .iter()
        .flat_map(|tn| tn.subtree_ids())
        .collect()
}

/// Highest `order` among the children of `parent`, if it has any.
pub fn max_child_order(nodes: &[Node], parent: Parent) -> Option<i64> {
    nodes
        .iter()
        .filter(|n| n.parent_id == parent)
        .map(|n| n.order)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use chrono::{Duration, Utc};

    fn node(title: &str, parent: Parent, order: i64) -> Node {
        Node {
            id: Uuid::new_v4(),
            parent_id: parent,
            title: title.to_string(),
            order,
            created_at: Utc::now(),
            kind: NodeKind::Folder,
        }
    }

    fn titles(level: &[TreeNode]) -> Vec<&str> {
        level.iter().map(|tn| tn.node.title.as_str()).collect()
    }

    #[test]
    fn nests_and_sorts_by_order() {
        let a = node("A", Parent::Root, 2);
        let b = node("B", Parent::Root, 1);
        let a1 = node("A1", Parent::Node(a.id), 5);
        let a2 = node("A2", Parent::Node(a.id), -3);
        let nodes = vec![a.clone(), b, a1, a2];

        let tree = build_tree(&nodes, Parent::Root);
        assert_eq!(titles(&tree), vec!["B", "A"]);
        assert_eq!(titles(&tree[1].children), vec!["A2", "A1"]);
        assert_eq!(tree[1].descendant_count(), 2);
    }

    #[test]
    fn equal_orders_fall_back_to_creation_time() {
        let mut first = node("First", Parent::Root, 0);
        let mut second = node("Second", Parent::Root, 0);
        first.created_at = Utc::now() - Duration::minutes(5);
        second.created_at = Utc::now();

        let tree = build_tree(&[second, first], Parent::Root);
        assert_eq!(titles(&tree), vec!["First", "Second"]);
    }

    #[test]
    fn omits_nodes_with_missing_parent() {
        let a = node("A", Parent::Root, 0);
        let stray = node("Stray", Parent::Node(Uuid::new_v4()), 0);
        let tree = build_tree(&[a, stray.clone()], Parent::Root);

        assert_eq!(titles(&tree), vec!["A"]);
        assert!(find(&tree, stray.id).is_none());
    }

    #[test]
    fn cycles_terminate_and_stay_unreachable() {
        let mut x = node("X", Parent::Root, 0);
        let y = node("Y", Parent::Node(x.id), 0);
        x.parent_id = Parent::Node(y.id);
        let nodes = vec![x.clone(), y.clone()];

        assert!(build_tree(&nodes, Parent::Root).is_empty());

        // Building below a node inside the cycle still terminates
        let below_x = build_tree(&nodes, Parent::Node(x.id));
        assert_eq!(titles(&below_x), vec!["Y"]);
        assert!(below_x[0].children.is_empty());
    }

    #[test]
    fn does_not_mutate_input() {
        let a = node("A", Parent::Root, 9);
        let nodes = vec![a.clone()];
        let _ = build_tree(&nodes, Parent::Root);
        assert_eq!(nodes[0], a);
    }

    #[test]
    fn subtree_ids_lists_parent_first() {
        let a = node("A", Parent::Root, 0);
        let b = node("B", Parent::Node(a.id), 0);
        let c = node("C", Parent::Node(b.id), 0);
        let tree = build_tree(&[c.clone(), b.clone(), a.clone()], Parent::Root);

        assert_eq!(tree[0].subtree_ids(), vec![a.id, b.id, c.id]);
        assert_eq!(reachable_ids(&[a.clone(), b, c]).len(), 3);
        assert_eq!(max_child_order(&[a], Parent::Root), Some(0));
    }
}
