use super::helpers::{display_node, fresh_order, resolve_parent};
use super::{CmdMessage, CmdResult};
use crate::error::{Result, StudyError};
use crate::index::{fmt_path, NodeSelector};
use crate::model::{NodeDraft, Parent};
use crate::store::DataStore;

/// What kind of node to create, with the file fields it starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    Folder,
    File { text: Option<String>, tags: Vec<String> },
}

pub fn run<S: DataStore>(
    store: &mut S,
    title: String,
    kind: NewNode,
    parent: Option<&NodeSelector>,
) -> Result<CmdResult> {
    let parent = resolve_parent(store, parent)?;
    if let Parent::Node(pid) = parent {
        let holder = store.get_node(&pid)?;
        if !holder.is_folder() {
            return Err(StudyError::Validation(format!(
                "'{}' is a file; notes can only be added to folders",
                holder.title
            )));
        }
    }

    let nodes = store.list_nodes()?;
    let order = fresh_order(&nodes, parent);
    let draft = match kind {
        NewNode::Folder => NodeDraft::folder(parent, title),
        NewNode::File { text, tags } => {
            let draft = NodeDraft::file(parent, title).with_tags(tags);
            match text {
                Some(text) => draft.with_text(text),
                None => draft,
            }
        }
    }
    .with_order(order);

    let node = store.add_node(draft)?;
    let display = display_node(store, node.id)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Created {} {}: {}",
        node.kind.name(),
        fmt_path(&display.path),
        node.title
    )));
    result.affected_nodes.push(display);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn file(text: &str) -> NewNode {
        NewNode::File {
            text: Some(text.to_string()),
            tags: vec!["exam".to_string()],
        }
    }

    #[test]
    fn creates_at_root_and_appends() {
        let mut store = InMemoryStore::new();
        run(&mut store, "First".into(), NewNode::Folder, None).unwrap();
        let result = run(&mut store, "Second".into(), file("body"), None).unwrap();

        assert_eq!(result.affected_nodes[0].path, vec![2]);
        let body = result.affected_nodes[0].node.file_body().unwrap().clone();
        assert_eq!(body.text.as_deref(), Some("body"));
        assert!(body.tags.contains("exam"));
    }

    #[test]
    fn creates_inside_folder() {
        let mut store = InMemoryStore::new();
        run(&mut store, "Math".into(), NewNode::Folder, None).unwrap();
        let result = run(
            &mut store,
            "Limits".into(),
            file("$\\lim$"),
            Some(&NodeSelector::Path(vec![1])),
        )
        .unwrap();

        assert_eq!(result.affected_nodes[0].path, vec![1, 1]);
    }

    #[test]
    fn rejects_file_as_parent() {
        let mut store = InMemoryStore::new();
        run(&mut store, "Note".into(), file(""), None).unwrap();
        let result = run(
            &mut store,
            "Child".into(),
            NewNode::Folder,
            Some(&NodeSelector::Path(vec![1])),
        );
        assert!(matches!(result, Err(StudyError::Validation(_))));
        assert_eq!(store.list_nodes().unwrap().len(), 1);
    }

    #[test]
    fn rejects_empty_title() {
        let mut store = InMemoryStore::new();
        let result = run(&mut store, "  ".into(), NewNode::Folder, None);
        assert!(matches!(result, Err(StudyError::Validation(_))));
    }
}
