//! # Command Layer
//!
//! This module contains the **core business logic** of studybook. Each command family
//! lives in its own submodule and works on domain types through the [`DataStore`] trait.
//!
//! ## What Commands Do NOT Do
//!
//! - **Any I/O** beyond the store: no stdout, no terminal concerns
//! - **Argument parsing**: that's the CLI layer's job
//! - **User interaction**: no prompts. Destructive commands offer a preview function
//!   so the client can ask for confirmation first
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult`], not strings:
//! - `affected_nodes`: nodes created or modified, with their display path
//! - `listed_nodes`: a nested tree to display
//! - `mistakes` / `subjects`: records to display
//! - `messages`: structured messages with levels (info, success, warning, error)
//!
//! ## Testing Strategy
//!
//! This is where most of the tests live. They run against `InMemoryStore`, so no
//! filesystem is involved.
//!
//! [`DataStore`]: crate::store::DataStore

use crate::config::StudyConfig;
use crate::model::{Mistake, Node, ReviewState, Subject};
use serde::Serialize;

pub mod config;
pub mod create;
pub mod delete;
pub mod doctor;
pub mod drop;
pub mod get;
pub mod guard;
pub mod helpers;
pub mod mistakes;
pub mod move_nodes;
pub mod subjects;
pub mod update;

/// A node paired with its display path at the time the result was built.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayNode {
    pub node: Node,
    pub path: Vec<usize>,
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    pub fn flat(node: Node, path: Vec<usize>) -> Self {
        Self {
            node,
            path,
            children: Vec::new(),
        }
    }
}

/// A mistake with its list position and derived review data.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayMistake {
    pub index: usize,
    pub mistake: Mistake,
    pub state: ReviewState,
    pub review_count: usize,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_nodes: Vec<DisplayNode>,
    pub listed_nodes: Vec<DisplayNode>,
    pub mistakes: Vec<DisplayMistake>,
    pub subjects: Vec<Subject>,
    pub messages: Vec<CmdMessage>,
    pub config: Option<StudyConfig>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_nodes(mut self, nodes: Vec<DisplayNode>) -> Self {
        self.affected_nodes = nodes;
        self
    }

    pub fn with_listed_nodes(mut self, nodes: Vec<DisplayNode>) -> Self {
        self.listed_nodes = nodes;
        self
    }

    pub fn with_mistakes(mut self, mistakes: Vec<DisplayMistake>) -> Self {
        self.mistakes = mistakes;
        self
    }

    pub fn with_subjects(mut self, subjects: Vec<Subject>) -> Self {
        self.subjects = subjects;
        self
    }
}
