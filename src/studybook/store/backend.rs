use crate::error::{Result, StudyError};
use crate::model::{Mistake, Node, Subject};
use std::collections::HashMap;
use uuid::Uuid;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while RecordStore handles the "what" (id minting, queries, doctor).
///
/// Every collection is loaded and saved whole; each save is one durable write.
pub trait StorageBackend {
    // --- Notes ---

    fn load_notes(&self) -> Result<HashMap<Uuid, Node>>;

    fn save_notes(&self, notes: &HashMap<Uuid, Node>) -> Result<()>;

    // --- Mistakes ---

    fn load_mistakes(&self) -> Result<HashMap<Uuid, Mistake>>;

    fn save_mistakes(&self, mistakes: &HashMap<Uuid, Mistake>) -> Result<()>;

    // --- Subjects ---

    fn load_subjects(&self) -> Result<HashMap<Uuid, Subject>>;

    fn save_subjects(&self, subjects: &HashMap<Uuid, Subject>) -> Result<()>;

    // --- Schema ---

    /// Version of the stored schema. `0` means nothing has been upgraded yet.
    fn schema_version(&self) -> Result<u32>;

    fn set_schema_version(&self, version: u32) -> Result<()>;
}

/// Fails with [`StudyError::QuotaExceeded`] when a payload of `size` bytes does not fit.
pub fn check_quota(size: usize, quota: Option<u64>) -> Result<()> {
    if let Some(limit) = quota {
        let size = size as u64;
        if size > limit {
            return Err(StudyError::QuotaExceeded { size, limit });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_allows_payloads_up_to_the_limit() {
        assert!(check_quota(10, None).is_ok());
        assert!(check_quota(10, Some(10)).is_ok());
        match check_quota(11, Some(10)) {
            Err(StudyError::QuotaExceeded { size, limit }) => {
                assert_eq!(size, 11);
                assert_eq!(limit, 10);
            }
            other => panic!("Expected QuotaExceeded, got {:?}", other),
        }
    }
}
