//! # Display Paths
//!
//! Nodes are identified by UUIDs, which nobody wants to type. The terminal client
//! addresses them by **display path** instead: the 1-based position of each ancestor
//! among its siblings, joined with dots.
//!
//! ```text
//! 1  Math              -> "1"
//! 1.1  Limits          -> "1.1"
//! 1.2  Series          -> "1.2"
//! 2  Physics           -> "2"
//! ```
//!
//! Paths are derived from the sibling order, so they shift when nodes are reordered or
//! moved. They are resolved to UUIDs once, at the API boundary, and everything below
//! that works on ids.
//!
//! Selectors accepted on the command line:
//! - Path: `"3"`, `"3.1"`
//! - Range of paths, in visual order: `"1-3"`, `"1.1-1.3"`
//! - Anything else is a title search term
//!
//! Mistakes are flat and addressed by their position in the full newest-first list
//! (`"1"`, `"2-4"`), independent of any subject filter in the current view.

use crate::tree::TreeNode;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A user input to select a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    Path(Vec<usize>),
    Range(Vec<usize>, Vec<usize>),
    Title(String),
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSelector::Path(path) => write!(f, "{}", fmt_path(path)),
            NodeSelector::Range(start, end) => {
                write!(f, "{}-{}", fmt_path(start), fmt_path(end))
            }
            NodeSelector::Title(t) => write!(f, "\"{}\"", t),
        }
    }
}

impl FromStr for NodeSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty selector".to_string());
        }
        if let Some(dash_pos) = s.find('-') {
            if dash_pos > 0 {
                if let (Ok(start), Ok(end)) =
                    (parse_path(&s[..dash_pos]), parse_path(&s[dash_pos + 1..]))
                {
                    return Ok(NodeSelector::Range(start, end));
                }
            }
        }
        match parse_path(s) {
            Ok(path) => Ok(NodeSelector::Path(path)),
            Err(_) => Ok(NodeSelector::Title(s.to_string())),
        }
    }
}

/// Parses a dot-separated path string. Segments are 1-based.
/// e.g. "1.2" -> [1, 2]
pub fn parse_path(s: &str) -> Result<Vec<usize>, String> {
    s.split('.')
        .map(|seg| match seg.parse::<usize>() {
            Ok(0) => Err(format!("Paths start at 1: {}", s)),
            Ok(n) => Ok(n),
            Err(_) => Err(format!("Invalid path: {}", s)),
        })
        .collect()
}

pub fn fmt_path(path: &[usize]) -> String {
    let s: Vec<String> = path.iter().map(|idx| idx.to_string()).collect();
    s.join(".")
}

/// Every node of the forest with its display path, in visual (depth-first) order.
pub fn linearize(roots: &[TreeNode]) -> Vec<(Vec<usize>, &TreeNode)> {
    let mut result = Vec::new();
    linearize_level(roots, &[], &mut result);
    result
}

fn linearize_level<'a>(
    level: &'a [TreeNode],
    prefix: &[usize],
    result: &mut Vec<(Vec<usize>, &'a TreeNode)>,
) {
    for (i, tn) in level.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i + 1);
        result.push((path.clone(), tn));
        linearize_level(&tn.children, &path, result);
    }
}

pub fn resolve_path<'a>(roots: &'a [TreeNode], path: &[usize]) -> Option<&'a TreeNode> {
    let (first, rest) = path.split_first()?;
    let mut current = roots.get(first.checked_sub(1)?)?;
    for idx in rest {
        current = current.children.get(idx.checked_sub(1)?)?;
    }
    Some(current)
}

pub fn path_of(roots: &[TreeNode], id: Uuid) -> Option<Vec<usize>> {
    for (i, tn) in roots.iter().enumerate() {
        if tn.node.id == id {
            return Some(vec![i + 1]);
        }
        if let Some(mut rest) = path_of(&tn.children, id) {
            rest.insert(0, i + 1);
            return Some(rest);
        }
    }
    None
}

/// Parses mistake list positions: "3" or an inclusive range "2-5".
pub fn parse_list_index(s: &str) -> Result<Vec<usize>, String> {
    let parse_one = |part: &str| -> Result<usize, String> {
        match part.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("Invalid index: {}", s)),
            Ok(n) => Ok(n),
        }
    };

    match s.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse_one(start)?, parse_one(end)?);
            if start > end {
                return Err(format!("Invalid range: {}", s));
            }
            Ok((start..=end).collect())
        }
        None => Ok(vec![parse_one(s)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind, Parent};
    use crate::tree::build_tree;
    use chrono::Utc;

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

    fn sample() -> (Vec<TreeNode>, Uuid) {
        let math = node("Math", Parent::Root, 0);
        let limits = node("Limits", Parent::Node(math.id), 0);
        let series = node("Series", Parent::Node(math.id), 1);
        let physics = node("Physics", Parent::Root, 1);
        let series_id = series.id;
        let roots = build_tree(&[math, limits, series, physics], Parent::Root);
        (roots, series_id)
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(
            "1.2".parse::<NodeSelector>().unwrap(),
            NodeSelector::Path(vec![1, 2])
        );
        assert_eq!(
            "1-3".parse::<NodeSelector>().unwrap(),
            NodeSelector::Range(vec![1], vec![3])
        );
        assert_eq!(
            "1.1-2".parse::<NodeSelector>().unwrap(),
            NodeSelector::Range(vec![1, 1], vec![2])
        );
        assert_eq!(
            "half-life".parse::<NodeSelector>().unwrap(),
            NodeSelector::Title("half-life".to_string())
        );
        assert!("".parse::<NodeSelector>().is_err());
    }

    #[test]
    fn test_zero_is_not_a_path() {
        assert!(parse_path("0").is_err());
        assert!(parse_path("1.0").is_err());
        assert_eq!(
            "0".parse::<NodeSelector>().unwrap(),
            NodeSelector::Title("0".to_string())
        );
    }

    #[test]
    fn test_linearize_visual_order() {
        let (roots, _) = sample();
        let paths: Vec<(String, &str)> = linearize(&roots)
            .into_iter()
            .map(|(p, tn)| (fmt_path(&p), tn.node.title.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("1".to_string(), "Math"),
                ("1.1".to_string(), "Limits"),
                ("1.2".to_string(), "Series"),
                ("2".to_string(), "Physics"),
            ]
        );
    }

    #[test]
    fn test_resolve_and_path_of_agree() {
        let (roots, series_id) = sample();
        assert_eq!(path_of(&roots, series_id), Some(vec![1, 2]));
        assert_eq!(resolve_path(&roots, &[1, 2]).unwrap().node.id, series_id);
        assert!(resolve_path(&roots, &[3]).is_none());
        assert!(resolve_path(&roots, &[]).is_none());
        assert!(path_of(&roots, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_parse_list_index() {
        assert_eq!(parse_list_index("2").unwrap(), vec![2]);
        assert_eq!(parse_list_index("2-4").unwrap(), vec![2, 3, 4]);
        assert!(parse_list_index("4-2").is_err());
        assert!(parse_list_index("0").is_err());
        assert!(parse_list_index("x").is_err());
    }
}
