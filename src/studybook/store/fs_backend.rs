use super::backend::{check_quota, StorageBackend};
use crate::error::{Result, StudyError};
use crate::model::{Mistake, Node, Subject};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const NOTES_FILE: &str = "notes.json";
pub const MISTAKES_FILE: &str = "mistakes.json";
pub const SUBJECTS_FILE: &str = "subjects.json";
pub const SCHEMA_FILE: &str = "schema.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchemaFile {
    version: u32,
}

/// JSON-file backend: one file per collection inside `root`.
///
/// ```text
/// <root>/
/// ├── schema.json      # {"version": N}
/// ├── notes.json       # {uuid: Node}
/// ├── mistakes.json    # {uuid: Mistake}
/// └── subjects.json    # {uuid: Subject}
/// ```
pub struct FsBackend {
    root: PathBuf,
    quota: Option<u64>,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root, quota: None }
    }

    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn read_json<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.root.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            StudyError::Store(format!("{} is not valid: {}", path.display(), e))
        })
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        check_quota(content.len(), self.quota)?;
        self.ensure_dir()?;

        // Atomic write: a crash mid-write never leaves a truncated collection
        let target = self.root.join(name);
        let tmp = self.root.join(format!(".{}-{}.tmp", name, Uuid::new_v4()));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load_notes(&self) -> Result<HashMap<Uuid, Node>> {
        self.read_json(NOTES_FILE)
    }

    fn save_notes(&self, notes: &HashMap<Uuid, Node>) -> Result<()> {
        self.write_json(NOTES_FILE, notes)
    }

    fn load_mistakes(&self) -> Result<HashMap<Uuid, Mistake>> {
        self.read_json(MISTAKES_FILE)
    }

    fn save_mistakes(&self, mistakes: &HashMap<Uuid, Mistake>) -> Result<()> {
        self.write_json(MISTAKES_FILE, mistakes)
    }

    fn load_subjects(&self) -> Result<HashMap<Uuid, Subject>> {
        self.read_json(SUBJECTS_FILE)
    }

    fn save_subjects(&self, subjects: &HashMap<Uuid, Subject>) -> Result<()> {
        self.write_json(SUBJECTS_FILE, subjects)
    }

    fn schema_version(&self) -> Result<u32> {
        let schema: SchemaFile = self.read_json(SCHEMA_FILE)?;
        Ok(schema.version)
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.write_json(SCHEMA_FILE, &SchemaFile { version })
    }
}
