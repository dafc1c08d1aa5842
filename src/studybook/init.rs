use crate::api::StudyApi;
use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::state::AppState;
use crate::store::fs::FileStore;
use crate::store::migrations::MigrationContext;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Overrides the data directory, mainly for tests and portable installs.
pub const HOME_ENV: &str = "STUDYBOOK_HOME";

pub struct StudyContext {
    pub api: StudyApi<FileStore>,
    pub config: StudyConfig,
    pub data_dir: PathBuf,
}

/// `STUDYBOOK_HOME` when set, otherwise the platform data directory.
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "studybook", "studybook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| StudyError::Api("Could not determine a data directory".to_string()))
}

pub fn initialize() -> Result<StudyContext> {
    initialize_at(resolve_data_dir()?)
}

/// Opens the store in `data_dir`, upgrading its schema first if needed.
pub fn initialize_at(data_dir: PathBuf) -> Result<StudyContext> {
    let config = StudyConfig::load(&data_dir).unwrap_or_else(|e| {
        warn!(error = %e, "unreadable config.json, using defaults");
        StudyConfig::default()
    });

    let store = FileStore::new(data_dir.clone()).with_quota(config.store_quota_bytes);
    let ctx = MigrationContext {
        default_subject: config.default_subject.clone(),
    };
    let applied = store.upgrade(&ctx)?;
    if !applied.is_empty() {
        info!(steps = ?applied, dir = %data_dir.display(), "upgraded data directory");
    }

    let state = AppState::load(&data_dir).unwrap_or_else(|e| {
        warn!(error = %e, "unreadable state.json, starting fresh");
        AppState::default()
    });

    let api = StudyApi::new(store, config.clone(), data_dir.clone()).with_state(state);
    Ok(StudyContext {
        api,
        config,
        data_dir,
    })
}
