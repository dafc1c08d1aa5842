use super::fs_backend::FsBackend;
use super::record_store::RecordStore;
use std::path::{Path, PathBuf};

/// Production store: JSON collections in the data directory.
pub type FileStore = RecordStore<FsBackend>;

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        RecordStore::with_backend(FsBackend::new(root))
    }

    pub fn with_quota(self, quota: Option<u64>) -> Self {
        RecordStore::with_backend(self.backend.with_quota(quota))
    }

    pub fn root(&self) -> &Path {
        self.backend.root()
    }
}
