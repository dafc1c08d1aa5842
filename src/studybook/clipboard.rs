//! # Clipboard
//!
//! Multi-select copy/cut/paste over the note tree.
//!
//! - **Cut** moves the selected nodes under the paste target, appended after its
//!   current children. Each move goes through the cycle guard; a node that would end up
//!   inside itself is skipped. The clipboard is emptied after the paste.
//! - **Copy** clones each selected node with its whole subtree. The store mints new ids
//!   top-down, so every clone is parented to the already-minted clone above it. A clone
//!   pasted next to its original gets a title suffix. The clipboard is kept, so the same
//!   selection can be pasted again.
//!
//! Copies are taken from a snapshot of the tree read before the first write. Pasting a
//! folder into one of its own descendants therefore clones the folder as it was, and
//! never walks into the clones it is creating.

use crate::commands::helpers::fresh_order;
use crate::commands::move_nodes::{move_node, MoveOutcome};
use crate::error::{Result, StudyError};
use crate::model::{Node, Parent};
use crate::store::DataStore;
use crate::tree::{build_tree, TreeNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub ids: Vec<Uuid>,
    pub mode: ClipMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOptions {
    pub max_depth: usize,
    pub copy_suffix: String,
}

impl Default for PasteOptions {
    fn default() -> Self {
        Self {
            max_depth: 500,
            copy_suffix: " (copy)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteOutcome {
    /// Ids of the top-level clones.
    pub created: Vec<Uuid>,
    /// Total records written by a copy, descendants included.
    pub cloned_records: usize,
    pub moved: Vec<Uuid>,
    /// Ids that no longer exist or were rejected by the cycle guard.
    pub skipped: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clipboard {
    pending: Option<ClipboardEntry>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, ids: Vec<Uuid>, mode: ClipMode) {
        if ids.is_empty() {
            self.pending = None;
        } else {
            self.pending = Some(ClipboardEntry { ids, mode });
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.pending.as_ref()
    }

    /// Drops ids that are no longer in `existing`, e.g. after a delete.
    pub fn retain_existing(&mut self, existing: impl Fn(&Uuid) -> bool) {
        if let Some(entry) = &mut self.pending {
            entry.ids.retain(|id| existing(id));
            if entry.ids.is_empty() {
                self.pending = None;
            }
        }
    }

    pub fn paste<S: DataStore>(
        &mut self,
        store: &mut S,
        target: Parent,
        opts: &PasteOptions,
    ) -> Result<PasteOutcome> {
        let Some(entry) = self.pending.clone() else {
            return Ok(PasteOutcome::default());
        };

        if let Parent::Node(target_id) = target {
            let target_node = store.get_node(&target_id)?;
            if !target_node.is_folder() {
                return Err(StudyError::Validation(format!(
                    "Cannot paste into '{}': not a folder",
                    target_node.title
                )));
            }
        }

        let outcome = match entry.mode {
            ClipMode::Cut => {
                let outcome = paste_cut(store, &entry.ids, target, opts)?;
                self.pending = None;
                outcome
            }
            ClipMode::Copy => paste_copy(store, &entry.ids, target, opts)?,
        };

        info!(
            mode = ?entry.mode,
            %target,
            created = outcome.created.len(),
            moved = outcome.moved.len(),
            skipped = outcome.skipped.len(),
            "pasted clipboard"
        );
        Ok(outcome)
    }
}

fn paste_cut<S: DataStore>(
    store: &mut S,
    ids: &[Uuid],
    target: Parent,
    opts: &PasteOptions,
) -> Result<PasteOutcome> {
    let mut outcome = PasteOutcome::default();
    for id in ids {
        if target == Parent::Node(*id) {
            outcome.skipped.push(*id);
            continue;
        }
        match store.get_node(id) {
            Ok(_) => {}
            Err(StudyError::NodeNotFound(_)) => {
                outcome.skipped.push(*id);
                continue;
            }
            Err(e) => return Err(e),
        }
        match move_node(store, *id, target, opts.max_depth)? {
            MoveOutcome::Moved | MoveOutcome::AlreadyThere => outcome.moved.push(*id),
            MoveOutcome::Rejected => outcome.skipped.push(*id),
        }
    }
    Ok(outcome)
}

fn paste_copy<S: DataStore>(
    store: &mut S,
    ids: &[Uuid],
    target: Parent,
    opts: &PasteOptions,
) -> Result<PasteOutcome> {
    // Snapshot every source subtree before the first write
    let nodes = store.list_nodes()?;
    let sources: Vec<(Node, Vec<TreeNode>)> = ids
        .iter()
        .filter_map(|id| nodes.iter().find(|n| n.id == *id))
        .map(|n| (n.clone(), build_tree(&nodes, Parent::Node(n.id))))
        .collect();

    let mut outcome = PasteOutcome::default();
    for id in ids {
        if !sources.iter().any(|(n, _)| n.id == *id) {
            outcome.skipped.push(*id);
        }
    }

    for (original, children) in &sources {
        let title = if original.parent_id == target {
            format!("{}{}", original.title, opts.copy_suffix)
        } else {
            original.title.clone()
        };
        let current = store.list_nodes()?;
        let order = fresh_order(&current, target);

        let clone = store.add_node(original.draft_copy(target, title, order))?;
        outcome.cloned_records += 1;
        outcome.cloned_records += clone_children(store, children, clone.id)?;
        debug!(original = %original.id, clone = %clone.id, "cloned subtree");
        outcome.created.push(clone.id);
    }
    Ok(outcome)
}

/// Clones `children` (and below) under `new_parent`. Returns the number of records written.
fn clone_children<S: DataStore>(store: &mut S, children: &[TreeNode], new_parent: Uuid) -> Result<usize> {
    let mut written = 0;
    for child in children {
        let node = &child.node;
        let clone = store.add_node(node.draft_copy(
            Parent::Node(new_parent),
            node.title.clone(),
            node.order,
        ))?;
        written += 1;
        written += clone_children(store, &child.children, clone.id)?;
    }
    Ok(written)
}
