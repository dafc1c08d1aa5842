//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single entry point
//! for every studybook operation, whichever client drives it.
//!
//! ## Role and Responsibilities
//!
//! - **Dispatches** to the command function for each operation
//! - **Normalizes inputs**: display paths and list positions become ids here, once
//! - **Owns application state**: selection, clipboard, search term, expanded folders
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no terminal I/O and no formatting. Business rules live in `commands/*.rs`
//! and the core units (`tree`, `clipboard`, `gesture`).
//!
//! ## Generic Over DataStore
//!
//! `StudyApi<S: DataStore>` runs on `FileStore` in production and on `InMemoryStore`
//! in tests.

use crate::clipboard::{ClipMode, PasteOptions};
use crate::commands::{self, helpers};
use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::gesture::{HoverExpand, LongPress};
use crate::index::{fmt_path, parse_list_index, NodeSelector};
use crate::model::MistakeDraft;
use crate::offline::AppManifest;
use crate::state::AppState;
use crate::store::DataStore;
use crate::tree::reachable_ids;
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

pub struct StudyApi<S: DataStore> {
    store: S,
    config: StudyConfig,
    state: AppState,
    data_dir: PathBuf,
}

impl<S: DataStore> StudyApi<S> {
    pub fn new(store: S, config: StudyConfig, data_dir: PathBuf) -> Self {
        Self {
            store,
            config,
            state: AppState::default(),
            data_dir,
        }
    }

    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> &StudyConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn save_state(&self) -> Result<()> {
        self.state.save(&self.data_dir)
    }

    // --- Notes ---

    pub fn create_note(
        &mut self,
        title: String,
        kind: commands::create::NewNode,
        parent: Option<&str>,
    ) -> Result<commands::CmdResult> {
        let parent = parse_destination(parent)?;
        commands::create::run(&mut self.store, title, kind, parent.as_ref())
    }

    /// Lists the tree, narrowed by `filter`. The search term is remembered.
    pub fn list_notes(&mut self, filter: NoteFilter) -> Result<commands::CmdResult> {
        self.state.search_term = filter.search_term.clone().unwrap_or_default();
        commands::get::run(&self.store, &filter)
    }

    pub fn view_notes<I: AsRef<str>>(&mut self, selectors: &[I]) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let result = commands::get::view(&self.store, &selectors)?;
        if let [only] = result.listed_nodes.as_slice() {
            self.state.selected = Some(only.node.id);
        }
        Ok(result)
    }

    pub fn update_notes<I: AsRef<str>>(
        &mut self,
        selectors: &[I],
        edits: &[NodeEdit],
    ) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        commands::update::run(&mut self.store, &selectors, edits)
    }

    pub fn move_notes<I: AsRef<str>>(
        &mut self,
        selectors: &[I],
        destination: Option<&str>,
    ) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let destination = parse_destination(destination)?;
        commands::move_nodes::run(
            &mut self.store,
            &selectors,
            destination.as_ref(),
            self.config.max_tree_depth,
        )
    }

    /// Completes a drag of `active` released over `over`.
    pub fn drop_note(&mut self, active: &str, over: &str) -> Result<commands::CmdResult> {
        let (active_path, active_id) = self.resolve_one(active)?;
        let (over_path, over_id) = self.resolve_one(over)?;

        let plan = commands::drop::run(
            &mut self.store,
            active_id,
            over_id,
            self.config.max_tree_depth,
        )?;

        let mut result = CmdResult::default();
        match plan {
            DropPlan::Noop => result.add_message(CmdMessage::info("Nothing to move")),
            DropPlan::Reject => result.add_message(CmdMessage::warning(format!(
                "Cannot move {} into its own subtree",
                fmt_path(&active_path)
            ))),
            DropPlan::Reparent(_) => {
                self.state.expand(over_id);
                result.add_message(CmdMessage::success(format!(
                    "Moved {} into {}",
                    fmt_path(&active_path),
                    fmt_path(&over_path)
                )));
                result
                    .affected_nodes
                    .push(helpers::display_node(&self.store, active_id)?);
            }
            DropPlan::Reorder(_) | DropPlan::Insert(_) => {
                result.add_message(CmdMessage::success(format!(
                    "Moved {} next to {}",
                    fmt_path(&active_path),
                    fmt_path(&over_path)
                )));
                result
                    .affected_nodes
                    .push(helpers::display_node(&self.store, active_id)?);
            }
        }
        Ok(result)
    }

    pub fn copy_notes<I: AsRef<str>>(&mut self, selectors: &[I]) -> Result<commands::CmdResult> {
        self.fill_clipboard(selectors, ClipMode::Copy)
    }

    pub fn cut_notes<I: AsRef<str>>(&mut self, selectors: &[I]) -> Result<commands::CmdResult> {
        self.fill_clipboard(selectors, ClipMode::Cut)
    }

    pub fn paste(&mut self, target: Option<&str>) -> Result<commands::CmdResult> {
        let mut result = CmdResult::default();
        if self.state.clipboard.is_empty() {
            result.add_message(CmdMessage::info("Clipboard is empty"));
            return Ok(result);
        }

        let target = parse_destination(target)?;
        let parent = helpers::resolve_parent(&self.store, target.as_ref())?;
        let opts = PasteOptions {
            max_depth: self.config.max_tree_depth,
            copy_suffix: self.config.copy_suffix.clone(),
        };
        let outcome = self.state.clipboard.paste(&mut self.store, parent, &opts)?;

        for id in outcome.created.iter().chain(outcome.moved.iter()) {
            result
                .affected_nodes
                .push(helpers::display_node(&self.store, *id)?);
        }
        if !outcome.created.is_empty() {
            result.add_message(CmdMessage::success(format!(
                "Pasted {} cop(ies), {} note(s) in total",
                outcome.created.len(),
                outcome.cloned_records
            )));
        }
        if !outcome.moved.is_empty() {
            result.add_message(CmdMessage::success(format!(
                "Moved {} note(s)",
                outcome.moved.len()
            )));
        }
        if !outcome.skipped.is_empty() {
            result.add_message(CmdMessage::warning(format!(
                "Skipped {} note(s) that are gone or would end up inside themselves",
                outcome.skipped.len()
            )));
        }
        Ok(result)
    }

    /// What deleting `selectors` would remove, for the confirmation prompt.
    pub fn preview_delete_notes<I: AsRef<str>>(&self, selectors: &[I]) -> Result<DeletePreview> {
        let selectors = parse_selectors(selectors)?;
        commands::delete::preview(&self.store, &selectors)
    }

    pub fn delete_notes<I: AsRef<str>>(&mut self, selectors: &[I]) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let limits = WalkLimits {
            max_depth: self.config.max_tree_depth,
        };
        let result = commands::delete::run(&mut self.store, &selectors, limits)?;
        self.prune_state()?;
        Ok(result)
    }

    pub fn doctor(&mut self) -> Result<commands::CmdResult> {
        let result = commands::doctor::run(&mut self.store)?;
        self.prune_state()?;
        Ok(result)
    }

    /// Timer that expands a collapsed folder hovered during a drag.
    pub fn hover_expand(&self) -> HoverExpand {
        HoverExpand::new(self.config.hover_expand_delay())
    }

    pub fn long_press(&self) -> LongPress {
        LongPress::new(self.config.long_press_delay())
    }

    pub fn expand_folder(&mut self, id: Uuid) {
        self.state.expand(id);
    }

    // --- Mistakes ---

    pub fn add_mistake(&mut self, draft: &MistakeDraft) -> Result<commands::CmdResult> {
        commands::mistakes::add(&mut self.store, draft)
    }

    pub fn edit_mistake(
        &mut self,
        index: usize,
        draft: &MistakeDraft,
    ) -> Result<commands::CmdResult> {
        commands::mistakes::edit(&mut self.store, index, draft)
    }

    /// The current draft of the mistake at `index`, for editing.
    pub fn mistake_draft(&self, index: usize) -> Result<MistakeDraft> {
        let resolved = helpers::resolve_mistakes(&self.store, &[index])?;
        resolved
            .first()
            .map(|(_, m)| MistakeDraft::from_mistake(m))
            .ok_or_else(|| StudyError::Api(format!("No mistake at index {}", index)))
    }

    pub fn list_mistakes(&self, subject: Option<&str>) -> Result<commands::CmdResult> {
        let subject = subject.map(|name| self.subject_id(name)).transpose()?;
        commands::mistakes::list(&self.store, subject)
    }

    pub fn show_mistakes<I: AsRef<str>>(&self, indexes: &[I]) -> Result<commands::CmdResult> {
        let indexes = parse_indexes(indexes)?;
        commands::mistakes::show(&self.store, &indexes)
    }

    pub fn reveal_mistake(&mut self, index: usize) -> Result<commands::CmdResult> {
        commands::mistakes::reveal(&mut self.store, index, Local::now())
    }

    pub fn toggle_mastered(&mut self, index: usize) -> Result<commands::CmdResult> {
        commands::mistakes::toggle_mastered(&mut self.store, index)
    }

    pub fn preview_delete_mistakes<I: AsRef<str>>(
        &self,
        indexes: &[I],
    ) -> Result<Vec<(usize, crate::model::Mistake)>> {
        let indexes = parse_indexes(indexes)?;
        commands::mistakes::preview_delete(&self.store, &indexes)
    }

    pub fn delete_mistakes<I: AsRef<str>>(&mut self, indexes: &[I]) -> Result<commands::CmdResult> {
        let indexes = parse_indexes(indexes)?;
        commands::mistakes::delete(&mut self.store, &indexes)
    }

    // --- Subjects ---

    pub fn subject_id(&self, name: &str) -> Result<Uuid> {
        Ok(commands::subjects::find_by_name(&self.store, name)?.id)
    }

    pub fn add_subject(&mut self, name: &str) -> Result<commands::CmdResult> {
        commands::subjects::add(&mut self.store, name)
    }

    pub fn list_subjects(&self) -> Result<commands::CmdResult> {
        commands::subjects::list(&self.store)
    }

    pub fn rename_subject(&mut self, name: &str, new_name: &str) -> Result<commands::CmdResult> {
        commands::subjects::rename(&mut self.store, name, new_name)
    }

    pub fn delete_subject(&mut self, name: &str) -> Result<commands::CmdResult> {
        commands::subjects::delete(&mut self.store, name)
    }

    // --- Settings ---

    pub fn config(&mut self, action: ConfigAction) -> Result<commands::CmdResult> {
        let result = commands::config::run(&self.data_dir, action)?;
        if let Some(config) = &result.config {
            self.config = config.clone();
        }
        Ok(result)
    }

    pub fn manifest(&self) -> AppManifest {
        AppManifest::default()
    }

    fn fill_clipboard<I: AsRef<str>>(
        &mut self,
        selectors: &[I],
        mode: ClipMode,
    ) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let resolved = helpers::resolve_selectors(&self.store, &selectors)?;
        let ids: Vec<Uuid> = resolved.iter().map(|(_, id)| *id).collect();
        let count = ids.len();
        self.state.clipboard.set(ids, mode);

        let verb = match mode {
            ClipMode::Copy => "Copied",
            ClipMode::Cut => "Cut",
        };
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::info(format!(
            "{} {} note(s) to the clipboard",
            verb, count
        )));
        Ok(result)
    }

    fn resolve_one(&self, input: &str) -> Result<(Vec<usize>, Uuid)> {
        let selector = NodeSelector::from_str(input).map_err(StudyError::Api)?;
        let resolved = helpers::resolve_selectors(&self.store, &[selector])?;
        match resolved.as_slice() {
            [(path, id)] => Ok((path.clone(), *id)),
            _ => Err(StudyError::Api(format!(
                "'{}' must select exactly one note",
                input
            ))),
        }
    }

    fn prune_state(&mut self) -> Result<()> {
        let nodes = self.store.list_nodes()?;
        let existing: HashSet<Uuid> = reachable_ids(&nodes);
        self.state.prune(&existing);
        Ok(())
    }
}

/// Parses node selectors. If every input is a path or range they are used as-is;
/// otherwise all inputs are joined into one title search.
fn parse_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<NodeSelector>> {
    let parsed: Vec<NodeSelector> = inputs
        .iter()
        .map(|s| NodeSelector::from_str(s.as_ref()).map_err(StudyError::Api))
        .collect::<Result<_>>()?;

    if parsed.iter().all(|s| !matches!(s, NodeSelector::Title(_))) {
        return Ok(parsed);
    }

    let search_term = inputs
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    Ok(vec![NodeSelector::Title(search_term)])
}

fn parse_destination(input: Option<&str>) -> Result<Option<NodeSelector>> {
    input
        .map(|s| NodeSelector::from_str(s).map_err(StudyError::Api))
        .transpose()
}

fn parse_indexes<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<usize>> {
    let mut indexes = Vec::new();
    for input in inputs {
        for idx in parse_list_index(input.as_ref()).map_err(StudyError::Api)? {
            if !indexes.contains(&idx) {
                indexes.push(idx);
            }
        }
    }
    Ok(indexes)
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::create::NewNode;
pub use crate::commands::delete::{DeletePreview, WalkLimits};
pub use crate::commands::drop::DropPlan;
pub use crate::commands::get::NoteFilter;
pub use crate::commands::update::NodeEdit;
pub use crate::commands::{CmdMessage, CmdResult, DisplayMistake, DisplayNode, MessageLevel};
