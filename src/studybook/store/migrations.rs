//! # Schema Upgrades
//!
//! The stored data carries a schema version. Each [`Migration`] brings it from
//! `version - 1` to `version`; [`run`] applies every step newer than what is stored,
//! in order, and records the version after each one so an interrupted upgrade resumes
//! where it stopped.
//!
//! | Version | Step |
//! |---------|------|
//! | 1 | mistakes collection |
//! | 2 | notes collection |
//! | 3 | subjects, with mistakes lacking a subject moved into a default one |
//! | 4 | review state: legacy mistake records persisted in the current shape |

use super::backend::StorageBackend;
use crate::error::Result;
use crate::model::Subject;
use tracing::info;
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 4;

/// Inputs some upgrade steps need beyond the stored data.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    /// Name of the subject that collects mistakes filed under no subject.
    pub default_subject: String,
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self {
            default_subject: "General".to_string(),
        }
    }
}

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub apply: fn(&dyn StorageBackend, &MigrationContext) -> Result<()>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create mistakes collection",
        apply: create_mistakes,
    },
    Migration {
        version: 2,
        name: "create notes collection",
        apply: create_notes,
    },
    Migration {
        version: 3,
        name: "add subjects",
        apply: backfill_subjects,
    },
    Migration {
        version: 4,
        name: "normalize review state",
        apply: normalize_review_state,
    },
];

/// Applies pending steps. Returns the names of those that ran.
pub fn run(backend: &dyn StorageBackend, ctx: &MigrationContext) -> Result<Vec<&'static str>> {
    let current = backend.schema_version()?;
    let mut applied = Vec::new();

    for step in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(version = step.version, step = step.name, "upgrading schema");
        (step.apply)(backend, ctx)?;
        backend.set_schema_version(step.version)?;
        applied.push(step.name);
    }
    Ok(applied)
}

// Loading yields an empty map for a missing collection; saving makes it exist.
fn create_mistakes(backend: &dyn StorageBackend, _ctx: &MigrationContext) -> Result<()> {
    let mistakes = backend.load_mistakes()?;
    backend.save_mistakes(&mistakes)
}

fn create_notes(backend: &dyn StorageBackend, _ctx: &MigrationContext) -> Result<()> {
    let notes = backend.load_notes()?;
    backend.save_notes(&notes)
}

fn backfill_subjects(backend: &dyn StorageBackend, ctx: &MigrationContext) -> Result<()> {
    let mut subjects = backend.load_subjects()?;
    let mut mistakes = backend.load_mistakes()?;

    let needs_default = subjects.is_empty() || mistakes.values().any(|m| m.subject_id.is_none());
    if !needs_default {
        return Ok(());
    }

    let default_id = match subjects
        .values()
        .find(|s| s.name.eq_ignore_ascii_case(&ctx.default_subject))
    {
        Some(existing) => existing.id,
        None => {
            let subject = Subject {
                id: Uuid::new_v4(),
                name: ctx.default_subject.clone(),
            };
            let id = subject.id;
            subjects.insert(id, subject);
            backend.save_subjects(&subjects)?;
            id
        }
    };

    let mut moved = 0;
    for mistake in mistakes.values_mut().filter(|m| m.subject_id.is_none()) {
        mistake.subject_id = Some(default_id);
        moved += 1;
    }
    if moved > 0 {
        info!(count = moved, subject = %ctx.default_subject, "filed mistakes under default subject");
        backend.save_mistakes(&mistakes)?;
    }
    Ok(())
}

// Legacy fields are folded in by Mistake's deserializer; writing back persists the new shape.
fn normalize_review_state(backend: &dyn StorageBackend, _ctx: &MigrationContext) -> Result<()> {
    let mistakes = backend.load_mistakes()?;
    backend.save_mistakes(&mistakes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mistake, Subject};
    use crate::store::mem_backend::MemBackend;
    use chrono::Utc;
    use std::collections::HashMap;

    fn mistake(subject_id: Option<Uuid>) -> Mistake {
        Mistake {
            id: Uuid::new_v4(),
            title: "Old entry".to_string(),
            question_images: vec!["data:image/png;base64,AAAA".to_string()],
            analysis_image: None,
            analysis_text: None,
            reflection: String::new(),
            created_at: Utc::now(),
            subject_id,
            review_logs: Vec::new(),
            is_mastered: false,
        }
    }

    #[test]
    fn fresh_store_runs_every_step_once() {
        let backend = MemBackend::new();
        let ctx = MigrationContext::default();

        let applied = run(&backend, &ctx).unwrap();
        assert_eq!(applied.len(), MIGRATIONS.len());
        assert_eq!(backend.schema_version().unwrap(), SCHEMA_VERSION);

        // An empty store still gets its default subject
        let subjects = backend.load_subjects().unwrap();
        assert_eq!(subjects.len(), 1);
        assert!(subjects.values().any(|s| s.name == "General"));

        assert!(run(&backend, &ctx).unwrap().is_empty());
    }

    #[test]
    fn backfill_files_unassigned_mistakes_under_default() {
        let backend = MemBackend::new();
        let physics = Subject {
            id: Uuid::new_v4(),
            name: "Physics".to_string(),
        };
        let mut subjects = HashMap::new();
        subjects.insert(physics.id, physics.clone());
        backend.save_subjects(&subjects).unwrap();

        let filed = mistake(Some(physics.id));
        let loose = mistake(None);
        let mut mistakes = HashMap::new();
        mistakes.insert(filed.id, filed.clone());
        mistakes.insert(loose.id, loose.clone());
        backend.save_mistakes(&mistakes).unwrap();
        backend.set_schema_version(2).unwrap();

        let ctx = MigrationContext {
            default_subject: "Unsorted".to_string(),
        };
        let applied = run(&backend, &ctx).unwrap();
        assert_eq!(applied, vec!["add subjects", "normalize review state"]);

        let subjects = backend.load_subjects().unwrap();
        let unsorted = subjects.values().find(|s| s.name == "Unsorted").unwrap();
        let mistakes = backend.load_mistakes().unwrap();
        assert_eq!(mistakes[&loose.id].subject_id, Some(unsorted.id));
        assert_eq!(mistakes[&filed.id].subject_id, Some(physics.id));
    }

    #[test]
    fn backfill_reuses_existing_default_subject() {
        let backend = MemBackend::new();
        let general = Subject {
            id: Uuid::new_v4(),
            name: "general".to_string(),
        };
        let mut subjects = HashMap::new();
        subjects.insert(general.id, general.clone());
        backend.save_subjects(&subjects).unwrap();

        let loose = mistake(None);
        let mut mistakes = HashMap::new();
        mistakes.insert(loose.id, loose.clone());
        backend.save_mistakes(&mistakes).unwrap();

        run(&backend, &MigrationContext::default()).unwrap();

        assert_eq!(backend.load_subjects().unwrap().len(), 1);
        assert_eq!(
            backend.load_mistakes().unwrap()[&loose.id].subject_id,
            Some(general.id)
        );
    }

    #[test]
    fn failed_step_keeps_previous_version() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);

        assert!(run(&backend, &MigrationContext::default()).is_err());
        backend.set_simulate_write_error(false);
        assert_eq!(backend.schema_version().unwrap(), 0);
    }
}
