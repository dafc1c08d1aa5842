use super::backend::{check_quota, StorageBackend};
use crate::error::{Result, StudyError};
use crate::model::{Mistake, Node, Subject};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since studybook is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    notes: RefCell<HashMap<Uuid, Node>>,
    mistakes: RefCell<HashMap<Uuid, Mistake>>,
    subjects: RefCell<HashMap<Uuid, Subject>>,
    schema_version: Cell<u32>,
    simulate_write_error: Cell<bool>,
    quota: Cell<Option<u64>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Caps the serialized size of any single collection write.
    pub fn set_quota(&self, quota: Option<u64>) {
        self.quota.set(quota);
    }

    fn guard_write<T: serde::Serialize>(&self, collection: &T) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(StudyError::Store("Simulated write error".to_string()));
        }
        if let Some(limit) = self.quota.get() {
            let size = serde_json::to_vec(collection)?.len();
            check_quota(size, Some(limit))?;
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_notes(&self) -> Result<HashMap<Uuid, Node>> {
        Ok(self.notes.borrow().clone())
    }

    fn save_notes(&self, notes: &HashMap<Uuid, Node>) -> Result<()> {
        self.guard_write(notes)?;
        *self.notes.borrow_mut() = notes.clone();
        Ok(())
    }

    fn load_mistakes(&self) -> Result<HashMap<Uuid, Mistake>> {
        Ok(self.mistakes.borrow().clone())
    }

    fn save_mistakes(&self, mistakes: &HashMap<Uuid, Mistake>) -> Result<()> {
        self.guard_write(mistakes)?;
        *self.mistakes.borrow_mut() = mistakes.clone();
        Ok(())
    }

    fn load_subjects(&self) -> Result<HashMap<Uuid, Subject>> {
        Ok(self.subjects.borrow().clone())
    }

    fn save_subjects(&self, subjects: &HashMap<Uuid, Subject>) -> Result<()> {
        self.guard_write(subjects)?;
        *self.subjects.borrow_mut() = subjects.clone();
        Ok(())
    }

    fn schema_version(&self) -> Result<u32> {
        Ok(self.schema_version.get())
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(StudyError::Store("Simulated write error".to_string()));
        }
        self.schema_version.set(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Parent};
    use chrono::Utc;

    fn folder(title: &str) -> Node {
        Node {
            id: Uuid::new_v4(),
            parent_id: Parent::Root,
            title: title.to_string(),
            order: 0,
            created_at: Utc::now(),
            kind: NodeKind::Folder,
        }
    }

    #[test]
    fn test_simulated_write_error_leaves_data_untouched() {
        let backend = MemBackend::new();
        let node = folder("Kept");
        let mut notes = HashMap::new();
        notes.insert(node.id, node.clone());
        backend.save_notes(&notes).unwrap();

        backend.set_simulate_write_error(true);
        notes.clear();
        assert!(backend.save_notes(&notes).is_err());

        backend.set_simulate_write_error(false);
        assert_eq!(backend.load_notes().unwrap().len(), 1);
    }

    #[test]
    fn test_quota_rejects_large_collections() {
        let backend = MemBackend::new();
        backend.set_quota(Some(16));

        let node = folder("A title that is far too long for sixteen bytes");
        let mut notes = HashMap::new();
        notes.insert(node.id, node);

        assert!(matches!(
            backend.save_notes(&notes),
            Err(StudyError::QuotaExceeded { .. })
        ));
        assert!(backend.load_notes().unwrap().is_empty());
    }
}
