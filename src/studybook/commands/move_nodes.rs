use super::helpers::{display_node, fresh_order, resolve_parent, resolve_selectors};
use super::guard::can_reparent;
use super::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::{fmt_path, NodeSelector};
use crate::model::Parent;
use crate::store::DataStore;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of placing one node under a new parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    AlreadyThere,
    /// Target is the node itself or inside its subtree.
    Rejected,
}

/// Re-parents `id` under `target`, appending it after the target's children.
///
/// The cycle guard runs first; a rejected move writes nothing.
pub fn move_node<S: DataStore>(
    store: &mut S,
    id: Uuid,
    target: Parent,
    max_depth: usize,
) -> Result<MoveOutcome> {
    let nodes = store.list_nodes()?;
    if !can_reparent(&nodes, id, target, max_depth) {
        debug!(node = %id, %target, "move rejected by cycle guard");
        return Ok(MoveOutcome::Rejected);
    }

    let mut node = store.get_node(&id)?;
    if node.parent_id == target {
        return Ok(MoveOutcome::AlreadyThere);
    }

    node.parent_id = target;
    node.order = fresh_order(&nodes, target);
    store.update_node(&node)?;

    info!(node = %id, %target, "moved node");
    Ok(MoveOutcome::Moved)
}

pub fn run<S: DataStore>(
    store: &mut S,
    selectors: &[NodeSelector],
    destination: Option<&NodeSelector>,
    max_depth: usize,
) -> Result<CmdResult> {
    let sources = resolve_selectors(store, selectors)?;
    let target = resolve_parent(store, destination)?;

    let mut result = CmdResult::default();
    let mut moved = Vec::new();

    for (path, id) in sources {
        match move_node(store, id, target, max_depth)? {
            MoveOutcome::Moved => moved.push(id),
            MoveOutcome::AlreadyThere => result.add_message(CmdMessage::info(format!(
                "Note {} is already there",
                fmt_path(&path)
            ))),
            MoveOutcome::Rejected => result.add_message(CmdMessage::warning(format!(
                "Skipped {}: cannot move a note into itself or its own subtree",
                fmt_path(&path)
            ))),
        }
    }

    // Paths are computed after all moves so they reflect the new tree
    for id in moved {
        result.affected_nodes.push(display_node(store, id)?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn fixture() -> StoreFixture {
        StoreFixture::new()
            .with_folder("A", None)
            .with_folder("B", Some("A"))
            .with_file("C", Some("B"))
            .with_folder("D", None)
    }

    #[test]
    fn test_move_appends_to_target() {
        let mut f = fixture().with_file("E", Some("D"));
        let (c, d) = (f.id("C"), f.id("D"));
        let outcome = move_node(&mut f.store, c, Parent::Node(d), 500).unwrap();

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(f.child_titles(Some("D")), vec!["E", "C"]);
    }

    #[test]
    fn test_move_into_descendant_is_rejected_silently() {
        let mut f = fixture();
        let (a, c) = (f.id("A"), f.id("C"));
        let outcome = move_node(&mut f.store, a, Parent::Node(c), 500).unwrap();

        assert_eq!(outcome, MoveOutcome::Rejected);
        assert!(f.node("A").parent_id.is_root());
    }

    #[test]
    fn test_run_reports_new_paths() {
        let mut f = fixture();
        let result = run(
            &mut f.store,
            &[NodeSelector::Path(vec![1, 1, 1])],
            None,
            500,
        )
        .unwrap();

        assert_eq!(result.affected_nodes.len(), 1);
        assert_eq!(result.affected_nodes[0].node.title, "C");
        assert_eq!(result.affected_nodes[0].path, vec![3]);
    }

    #[test]
    fn test_run_skips_rejected_and_keeps_going() {
        let mut f = fixture();
        let result = run(
            &mut f.store,
            &[
                NodeSelector::Title("A".to_string()),
                NodeSelector::Title("D".to_string()),
            ],
            Some(&NodeSelector::Title("B".to_string())),
            500,
        )
        .unwrap();

        assert_eq!(result.affected_nodes.len(), 1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(f.node("D").parent_id, Parent::Node(f.id("B")));
    }
}
