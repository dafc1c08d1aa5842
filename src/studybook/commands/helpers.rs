use super::{DisplayMistake, DisplayNode};
use crate::error::{Result, StudyError};
use crate::index::{fmt_path, linearize, path_of, NodeSelector};
use crate::model::{Mistake, Node, Parent};
use crate::store::DataStore;
use crate::tree::{build_tree, max_child_order, TreeNode};
use chrono::{Local, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub fn node_tree<S: DataStore>(store: &S) -> Result<Vec<TreeNode>> {
    let nodes = store.list_nodes()?;
    Ok(build_tree(&nodes, Parent::Root))
}

/// Converts a tree into display nodes carrying their paths.
pub fn display_tree(roots: &[TreeNode]) -> Vec<DisplayNode> {
    display_level(roots, &[])
}

fn display_level(level: &[TreeNode], prefix: &[usize]) -> Vec<DisplayNode> {
    level
        .iter()
        .enumerate()
        .map(|(i, tn)| {
            let mut path = prefix.to_vec();
            path.push(i + 1);
            DisplayNode {
                node: tn.node.clone(),
                children: display_level(&tn.children, &path),
                path,
            }
        })
        .collect()
}

/// Flat display node for `id`, with its current path (empty when unreachable).
pub fn display_node<S: DataStore>(store: &S, id: Uuid) -> Result<DisplayNode> {
    let node = store.get_node(&id)?;
    let roots = node_tree(store)?;
    let path = path_of(&roots, id).unwrap_or_default();
    Ok(DisplayNode::flat(node, path))
}

/// Resolves selectors to ids in visual order, dropping duplicates.
pub fn resolve_selectors<S: DataStore>(
    store: &S,
    selectors: &[NodeSelector],
) -> Result<Vec<(Vec<usize>, Uuid)>> {
    let roots = node_tree(store)?;
    let linearized = linearize(&roots);

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    let mut push = |path: &Vec<usize>, id: Uuid, results: &mut Vec<(Vec<usize>, Uuid)>| {
        if seen.insert(id) {
            results.push((path.clone(), id));
        }
    };

    for selector in selectors {
        match selector {
            NodeSelector::Path(path) => {
                let (p, tn) = linearized
                    .iter()
                    .find(|(p, _)| p == path)
                    .ok_or_else(|| {
                        StudyError::Api(format!("No note at {}", fmt_path(path)))
                    })?;
                push(p, tn.node.id, &mut results);
            }
            NodeSelector::Range(start_path, end_path) => {
                let start_idx = linearized
                    .iter()
                    .position(|(p, _)| p == start_path)
                    .ok_or_else(|| {
                        StudyError::Api(format!("Range start {} not found", fmt_path(start_path)))
                    })?;
                let end_idx = linearized
                    .iter()
                    .position(|(p, _)| p == end_path)
                    .ok_or_else(|| {
                        StudyError::Api(format!("Range end {} not found", fmt_path(end_path)))
                    })?;

                if start_idx > end_idx {
                    return Err(StudyError::Api(format!(
                        "Invalid range: {} appears after {} in the tree",
                        fmt_path(start_path),
                        fmt_path(end_path)
                    )));
                }

                for (p, tn) in linearized.iter().take(end_idx + 1).skip(start_idx) {
                    push(p, tn.node.id, &mut results);
                }
            }
            NodeSelector::Title(term) => {
                let term_lower = term.to_lowercase();
                let matches: Vec<&(Vec<usize>, &TreeNode)> = linearized
                    .iter()
                    .filter(|(_, tn)| tn.node.title.to_lowercase().contains(&term_lower))
                    .collect();

                match matches.as_slice() {
                    [] => {
                        return Err(StudyError::Api(format!(
                            "No note found matching \"{}\"",
                            term
                        )))
                    }
                    [(p, tn)] => push(p, tn.node.id, &mut results),
                    many => {
                        return Err(StudyError::Api(format!(
                            "\"{}\" matches {} notes. Please be more specific.",
                            term,
                            many.len()
                        )))
                    }
                }
            }
        }
    }

    Ok(results)
}

/// Resolves an optional selector to a parent reference. `None` means the root.
pub fn resolve_parent<S: DataStore>(store: &S, selector: Option<&NodeSelector>) -> Result<Parent> {
    let Some(selector) = selector else {
        return Ok(Parent::Root);
    };
    let resolved = resolve_selectors(store, std::slice::from_ref(selector))?;
    match resolved.as_slice() {
        [(_, id)] => Ok(Parent::Node(*id)),
        _ => Err(StudyError::Api(
            "Destination must resolve to a single note".to_string(),
        )),
    }
}

/// The full newest-first mistake list with 1-based positions.
pub fn indexed_mistakes<S: DataStore>(store: &S) -> Result<Vec<(usize, Mistake)>> {
    Ok(store
        .list_mistakes(None)?
        .into_iter()
        .enumerate()
        .map(|(i, m)| (i + 1, m))
        .collect())
}

pub fn resolve_mistakes<S: DataStore>(store: &S, indexes: &[usize]) -> Result<Vec<(usize, Mistake)>> {
    let all = indexed_mistakes(store)?;
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for idx in indexes {
        if !seen.insert(*idx) {
            continue;
        }
        let entry = all
            .iter()
            .find(|(i, _)| i == idx)
            .ok_or_else(|| StudyError::Api(format!("No mistake at index {}", idx)))?;
        results.push(entry.clone());
    }
    Ok(results)
}

pub fn display_mistake<S: DataStore>(store: &S, index: usize, mistake: Mistake) -> Result<DisplayMistake> {
    let names = subject_names(store)?;
    Ok(to_display_mistake(&names, index, mistake))
}

pub fn subject_names<S: DataStore>(store: &S) -> Result<HashMap<Uuid, String>> {
    Ok(store
        .list_subjects()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect())
}

pub fn to_display_mistake(
    names: &HashMap<Uuid, String>,
    index: usize,
    mistake: Mistake,
) -> DisplayMistake {
    let today = Local::now().date_naive();
    DisplayMistake {
        index,
        state: mistake.review_state(today),
        review_count: mistake.review_count(),
        subject_name: mistake.subject_id.and_then(|id| names.get(&id).cloned()),
        mistake,
    }
}

/// Order for a node newly placed under `parent`: after every existing sibling,
/// and never below the current timestamp.
pub fn fresh_order(nodes: &[Node], parent: Parent) -> i64 {
    let now = Utc::now().timestamp_millis();
    match max_child_order(nodes, parent) {
        Some(max) => now.max(max.saturating_add(1)),
        None => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn fixture() -> StoreFixture {
        StoreFixture::new()
            .with_folder("Math", None)
            .with_file("Limits", Some("Math"))
            .with_file("Series", Some("Math"))
            .with_folder("Physics", None)
    }

    #[test]
    fn test_resolve_path_and_range() {
        let f = fixture();
        let resolved = resolve_selectors(
            &f.store,
            &[NodeSelector::Range(vec![1, 2], vec![2])],
        )
        .unwrap();
        let ids: Vec<Uuid> = resolved.into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec![f.id("Series"), f.id("Physics")]);
    }

    #[test]
    fn test_resolve_deduplicates() {
        let f = fixture();
        let resolved = resolve_selectors(
            &f.store,
            &[
                NodeSelector::Path(vec![1]),
                NodeSelector::Title("math".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_resolve_title_must_be_unique() {
        let f = fixture();
        // "s" is in "Limits", "Series" and "Physics"
        let result = resolve_selectors(&f.store, &[NodeSelector::Title("s".to_string())]);
        assert!(matches!(result, Err(StudyError::Api(_))));

        let missing = resolve_selectors(&f.store, &[NodeSelector::Path(vec![9])]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_resolve_parent_defaults_to_root() {
        let f = fixture();
        assert_eq!(resolve_parent(&f.store, None).unwrap(), Parent::Root);
        assert_eq!(
            resolve_parent(&f.store, Some(&NodeSelector::Path(vec![2]))).unwrap(),
            Parent::Node(f.id("Physics"))
        );
    }

    #[test]
    fn test_fresh_order_is_after_siblings() {
        let f = fixture();
        let nodes = f.store.list_nodes().unwrap();
        let parent = Parent::Node(f.id("Math"));
        let order = fresh_order(&nodes, parent);
        assert!(nodes
            .iter()
            .filter(|n| n.parent_id == parent)
            .all(|n| n.order < order));
    }

    #[test]
    fn test_display_tree_paths() {
        let f = fixture();
        let roots = node_tree(&f.store).unwrap();
        let display = display_tree(&roots);
        assert_eq!(display[0].children[1].path, vec![1, 2]);
        assert_eq!(display[0].children[1].node.title, "Series");
    }
}
