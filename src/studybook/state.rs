//! Application state that outlives a single command: the selection, the clipboard, the
//! active search and which folders are expanded. Persisted as `state.json` next to the
//! data so the terminal client can pick up where the last invocation left off.

use crate::clipboard::Clipboard;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use uuid::Uuid;

const STATE_FILENAME: &str = "state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub selected: Option<Uuid>,
    pub clipboard: Clipboard,
    pub search_term: String,
    pub expanded: BTreeSet<Uuid>,
}

impl AppState {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(STATE_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        fs::write(dir.join(STATE_FILENAME), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn expand(&mut self, folder: Uuid) {
        self.expanded.insert(folder);
    }

    /// Returns whether the folder is expanded afterwards.
    pub fn toggle_expanded(&mut self, folder: Uuid) -> bool {
        if self.expanded.remove(&folder) {
            false
        } else {
            self.expanded.insert(folder);
            true
        }
    }

    pub fn is_expanded(&self, folder: &Uuid) -> bool {
        self.expanded.contains(folder)
    }

    /// Forgets ids that no longer exist.
    pub fn prune(&mut self, existing: &HashSet<Uuid>) {
        if self.selected.is_some_and(|id| !existing.contains(&id)) {
            self.selected = None;
        }
        self.expanded.retain(|id| existing.contains(id));
        self.clipboard.retain_existing(|id| existing.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipMode;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_default() {
        let temp = tempdir().unwrap();
        assert_eq!(AppState::load(temp.path()).unwrap(), AppState::default());
    }

    #[test]
    fn persists_clipboard_and_expansion() {
        let temp = tempdir().unwrap();
        let folder = Uuid::new_v4();
        let mut state = AppState::default();
        state.expand(folder);
        state.clipboard.set(vec![folder], ClipMode::Cut);
        state.search_term = "vectors".into();
        state.save(temp.path()).unwrap();

        let loaded = AppState::load(temp.path()).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.clipboard.entry().map(|e| e.mode), Some(ClipMode::Cut));
    }

    #[test]
    fn prune_drops_deleted_ids() {
        let kept = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let mut state = AppState {
            selected: Some(gone),
            ..Default::default()
        };
        state.expand(kept);
        state.expand(gone);
        state.clipboard.set(vec![gone], ClipMode::Copy);

        state.prune(&HashSet::from([kept]));
        assert_eq!(state.selected, None);
        assert!(state.is_expanded(&kept));
        assert!(!state.is_expanded(&gone));
        assert!(state.clipboard.is_empty());
    }

    #[test]
    fn toggle_flips_expansion() {
        let mut state = AppState::default();
        let id = Uuid::new_v4();
        assert!(state.toggle_expanded(id));
        assert!(!state.toggle_expanded(id));
    }
}
