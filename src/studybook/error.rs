use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Mistake not found: {0}")]
    MistakeNotFound(Uuid),

    #[error("Subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage quota exceeded: {size} bytes would exceed the {limit} byte limit")]
    QuotaExceeded { size: u64, limit: u64 },

    #[error("Corrupt note tree: {0}")]
    CorruptTree(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl StudyError {
    /// True for failures raised by the store while persisting a write.
    ///
    /// Clients use this to keep the user's unsaved input around and suggest
    /// shrinking it, instead of treating the error as fatal.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            StudyError::QuotaExceeded { .. } | StudyError::Io(_) | StudyError::Store(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StudyError>;
