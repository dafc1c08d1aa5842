use super::helpers::{display_tree, node_tree, resolve_selectors};
use super::{CmdResult, DisplayNode};
use crate::error::Result;
use crate::index::NodeSelector;
use crate::model::Node;
use crate::store::DataStore;
use crate::tree::find;
use pulldown_cmark::{Event, Options, Parser, TagEnd};

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// Case-insensitive term matched against title, tags and body text.
    pub search_term: Option<String>,
    /// Nodes must carry all of these tags.
    pub tags: Vec<String>,
}

impl NoteFilter {
    pub fn is_empty(&self) -> bool {
        self.search_term.as_deref().map_or(true, |t| t.trim().is_empty()) && self.tags.is_empty()
    }

    pub fn matches(&self, node: &Node) -> bool {
        let body = node.file_body();

        if !self.tags.is_empty() {
            let Some(body) = body else {
                return false;
            };
            let all_tags = self
                .tags
                .iter()
                .all(|t| body.tags.contains(&t.trim().trim_start_matches('#').to_lowercase()));
            if !all_tags {
                return false;
            }
        }

        let Some(term) = self.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty())
        else {
            return true;
        };
        let term = term.to_lowercase();

        if node.title.to_lowercase().contains(&term) {
            return true;
        }
        let Some(body) = body else {
            return false;
        };
        if body.tags.iter().any(|t| t.contains(&term)) {
            return true;
        }
        body.text
            .as_deref()
            .map(|text| plain_text(text).to_lowercase().contains(&term))
            .unwrap_or(false)
    }
}

/// Readable text of a Markdown body: markup dropped, math and code kept verbatim.
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    for event in Parser::new_ext(markdown, Options::all()) {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => {
                out.push_str(&t)
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock) => {
                out.push('\n')
            }
            _ => {}
        }
    }
    out.trim_end().to_string()
}

/// Lists the tree. With a filter, only matching nodes and their ancestors are kept.
pub fn run<S: DataStore>(store: &S, filter: &NoteFilter) -> Result<CmdResult> {
    let tree = display_tree(&node_tree(store)?);
    let listed = if filter.is_empty() {
        tree
    } else {
        prune(tree, filter)
    };
    Ok(CmdResult::default().with_listed_nodes(listed))
}

fn prune(level: Vec<DisplayNode>, filter: &NoteFilter) -> Vec<DisplayNode> {
    level
        .into_iter()
        .filter_map(|mut dn| {
            dn.children = prune(dn.children, filter);
            if filter.matches(&dn.node) || !dn.children.is_empty() {
                Some(dn)
            } else {
                None
            }
        })
        .collect()
}

/// Shows the selected nodes, each with its subtree.
pub fn view<S: DataStore>(store: &S, selectors: &[NodeSelector]) -> Result<CmdResult> {
    let resolved = resolve_selectors(store, selectors)?;
    let tree = display_tree(&node_tree(store)?);

    let mut listed = Vec::with_capacity(resolved.len());
    for (_, id) in resolved {
        if let Some(dn) = find_display(&tree, id) {
            listed.push(dn.clone());
        }
    }
    Ok(CmdResult::default().with_listed_nodes(listed))
}

fn find_display(level: &[DisplayNode], id: uuid::Uuid) -> Option<&DisplayNode> {
    for dn in level {
        if dn.node.id == id {
            return Some(dn);
        }
        if let Some(found) = find_display(&dn.children, id) {
            return Some(found);
        }
    }
    None
}

/// Number of nodes below `id` in the current tree.
pub fn descendant_count<S: DataStore>(store: &S, id: uuid::Uuid) -> Result<usize> {
    let roots = node_tree(store)?;
    Ok(find(&roots, id).map_or(0, |tn| tn.descendant_count()))
}
