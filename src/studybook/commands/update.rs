use super::helpers::resolve_selectors;
use super::{CmdMessage, CmdResult, DisplayNode};
use crate::error::{Result, StudyError};
use crate::index::{fmt_path, NodeSelector};
use crate::model::{Attachment, Node};
use crate::store::DataStore;
use tracing::info;

/// A single change to a node. Everything but `Rename` is file-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEdit {
    Rename(String),
    SetText(Option<String>),
    AddTags(Vec<String>),
    RemoveTags(Vec<String>),
    Attach {
        image_data: String,
        description: String,
    },
    /// 1-based position in the attachment list.
    Detach(usize),
}

fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#').to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Applies `edit` to `node` in memory. Nothing is written.
pub fn apply_edit(node: &mut Node, edit: &NodeEdit) -> Result<()> {
    match edit {
        NodeEdit::Rename(title) => {
            let title = title.trim();
            if title.is_empty() {
                return Err(StudyError::Validation("Title cannot be empty".to_string()));
            }
            node.title = title.to_string();
        }
        NodeEdit::SetText(text) => {
            node.file_body_mut()?.text = text.clone().filter(|t| !t.trim().is_empty());
        }
        NodeEdit::AddTags(tags) => {
            let body = node.file_body_mut()?;
            body.tags.extend(tags.iter().filter_map(|t| normalize_tag(t)));
        }
        NodeEdit::RemoveTags(tags) => {
            let body = node.file_body_mut()?;
            for tag in tags.iter().filter_map(|t| normalize_tag(t)) {
                body.tags.remove(&tag);
            }
        }
        NodeEdit::Attach {
            image_data,
            description,
        } => {
            if !image_data.starts_with("data:") {
                return Err(StudyError::Validation(
                    "Attachments must be inline data URLs".to_string(),
                ));
            }
            node.file_body_mut()?
                .content
                .push(Attachment::new(image_data.clone(), description.clone()));
        }
        NodeEdit::Detach(position) => {
            let body = node.file_body_mut()?;
            if *position == 0 || *position > body.content.len() {
                return Err(StudyError::Validation(format!(
                    "No attachment at position {} ({} attached)",
                    position,
                    body.content.len()
                )));
            }
            body.content.remove(position - 1);
        }
    }
    Ok(())
}

/// Applies the same edits to every selected node. Each node is validated in full
/// before it is written.
pub fn run<S: DataStore>(
    store: &mut S,
    selectors: &[NodeSelector],
    edits: &[NodeEdit],
) -> Result<CmdResult> {
    if edits.is_empty() {
        return Ok(CmdResult::default());
    }

    let resolved = resolve_selectors(store, selectors)?;
    let mut result = CmdResult::default();

    for (path, id) in resolved {
        let mut node = store.get_node(&id)?;
        for edit in edits {
            apply_edit(&mut node, edit)?;
        }
        store.update_node(&node)?;
        info!(node = %id, edits = edits.len(), "updated node");

        result.add_message(CmdMessage::success(format!(
            "Updated {}: {}",
            fmt_path(&path),
            node.title
        )));
        result.affected_nodes.push(DisplayNode::flat(node, path));
    }

    Ok(result)
}
