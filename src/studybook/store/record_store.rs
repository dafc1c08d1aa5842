use super::backend::StorageBackend;
use super::migrations::{self, MigrationContext};
use super::{DataStore, DoctorReport};
use crate::error::{Result, StudyError};
use crate::model::{Mistake, MistakeDraft, Node, NodeDraft, Parent, Subject};
use crate::tree::{self, sort_siblings};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct RecordStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> RecordStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Brings the stored data up to the current schema version.
    ///
    /// Returns the names of the steps that ran; empty when already current.
    pub fn upgrade(&self, ctx: &MigrationContext) -> Result<Vec<&'static str>> {
        migrations::run(&self.backend, ctx)
    }

    /// Internal reconciliation logic used by doctor.
    fn reconcile(&self) -> Result<DoctorReport> {
        let mut report = DoctorReport::default();

        let mut notes = self.backend.load_notes()?;
        let mut notes_changed = false;

        // 1. Orphans: parent reference points at nothing
        let orphan_ids: Vec<Uuid> = notes
            .values()
            .filter(|n| matches!(n.parent_id, Parent::Node(pid) if !notes.contains_key(&pid)))
            .map(|n| n.id)
            .collect();
        for id in orphan_ids {
            let order = next_root_order(&notes);
            if let Some(node) = notes.get_mut(&id) {
                warn!(node = %id, "re-rooting orphaned node");
                node.parent_id = Parent::Root;
                node.order = order;
                report.reattached_orphans += 1;
                notes_changed = true;
            }
        }

        // 2. Cycles: whatever is still unreachable from root hangs off a cycle.
        // Each pass re-roots one node on a cycle, so this ends after at most n passes.
        loop {
            let all: Vec<Node> = notes.values().cloned().collect();
            let reachable = tree::reachable_ids(&all);
            let Some(start) = all.iter().find(|n| !reachable.contains(&n.id)) else {
                break;
            };
            let Some(on_cycle) = find_cycle_member(&notes, start.id) else {
                break;
            };
            let order = next_root_order(&notes);
            if let Some(node) = notes.get_mut(&on_cycle) {
                warn!(node = %on_cycle, "breaking parent cycle");
                node.parent_id = Parent::Root;
                node.order = order;
                report.broken_cycles += 1;
                notes_changed = true;
            }
        }

        if notes_changed {
            self.backend.save_notes(&notes)?;
        }

        // 3. Mistakes filed under a subject that no longer exists
        let subjects = self.backend.load_subjects()?;
        let mut mistakes = self.backend.load_mistakes()?;
        let mut mistakes_changed = false;
        for mistake in mistakes.values_mut() {
            if let Some(sid) = mistake.subject_id {
                if !subjects.contains_key(&sid) {
                    mistake.subject_id = None;
                    report.cleared_subject_refs += 1;
                    mistakes_changed = true;
                }
            }
        }
        if mistakes_changed {
            self.backend.save_mistakes(&mistakes)?;
        }

        Ok(report)
    }
}

fn next_root_order(notes: &HashMap<Uuid, Node>) -> i64 {
    notes
        .values()
        .filter(|n| n.parent_id.is_root())
        .map(|n| n.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Follows parent links from `start` until a node repeats; that node is on a cycle.
fn find_cycle_member(notes: &HashMap<Uuid, Node>, start: Uuid) -> Option<Uuid> {
    let mut seen = HashSet::new();
    let mut current = start;
    loop {
        if !seen.insert(current) {
            return Some(current);
        }
        match notes.get(&current)?.parent_id {
            Parent::Root => return None,
            Parent::Node(pid) => current = pid,
        }
    }
}

fn normalize_subject_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudyError::Validation(
            "Subject name cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn ensure_unique_name(subjects: &HashMap<Uuid, Subject>, name: &str, except: Option<Uuid>) -> Result<()> {
    let clash = subjects
        .values()
        .any(|s| Some(s.id) != except && s.name.eq_ignore_ascii_case(name));
    if clash {
        return Err(StudyError::Validation(format!(
            "A subject named '{}' already exists",
            name
        )));
    }
    Ok(())
}

impl<B: StorageBackend> DataStore for RecordStore<B> {
    fn add_node(&mut self, draft: NodeDraft) -> Result<Node> {
        draft.validate()?;

        let mut notes = self.backend.load_notes()?;
        if let Parent::Node(pid) = draft.parent_id {
            if !notes.contains_key(&pid) {
                return Err(StudyError::NodeNotFound(pid));
            }
        }

        let node = Node {
            id: Uuid::new_v4(),
            parent_id: draft.parent_id,
            title: draft.title.trim().to_string(),
            order: draft.order,
            created_at: Utc::now(),
            kind: draft.kind,
        };
        notes.insert(node.id, node.clone());
        self.backend.save_notes(&notes)?;

        debug!(node = %node.id, parent = %node.parent_id, kind = node.kind.name(), "added node");
        Ok(node)
    }

    fn get_node(&self, id: &Uuid) -> Result<Node> {
        let notes = self.backend.load_notes()?;
        notes.get(id).cloned().ok_or(StudyError::NodeNotFound(*id))
    }

    fn list_nodes(&self) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.backend.load_notes()?.into_values().collect();
        sort_siblings(&mut nodes);
        Ok(nodes)
    }

    fn update_node(&mut self, node: &Node) -> Result<()> {
        if node.title.trim().is_empty() {
            return Err(StudyError::Validation("Title cannot be empty".to_string()));
        }

        let mut notes = self.backend.load_notes()?;
        let existing = notes.get(&node.id).ok_or(StudyError::NodeNotFound(node.id))?;

        if existing.kind.name() != node.kind.name() {
            return Err(StudyError::Validation(format!(
                "Cannot change '{}' from {} to {}",
                existing.title,
                existing.kind.name(),
                node.kind.name()
            )));
        }
        if let Parent::Node(pid) = node.parent_id {
            if pid == node.id {
                return Err(StudyError::Validation(format!(
                    "'{}' cannot be its own parent",
                    node.title
                )));
            }
            if !notes.contains_key(&pid) {
                return Err(StudyError::NodeNotFound(pid));
            }
        }

        notes.insert(node.id, node.clone());
        self.backend.save_notes(&notes)
    }

    fn delete_node(&mut self, id: &Uuid) -> Result<()> {
        let mut notes = self.backend.load_notes()?;
        if notes.remove(id).is_none() {
            return Err(StudyError::NodeNotFound(*id));
        }
        self.backend.save_notes(&notes)
    }

    fn children_of(&self, parent: Parent) -> Result<Vec<Node>> {
        let mut children: Vec<Node> = self
            .backend
            .load_notes()?
            .into_values()
            .filter(|n| n.parent_id == parent)
            .collect();
        sort_siblings(&mut children);
        Ok(children)
    }

    fn add_mistake(&mut self, draft: &MistakeDraft) -> Result<Mistake> {
        draft.validate()?;
        if let Some(sid) = draft.subject_id {
            if !self.backend.load_subjects()?.contains_key(&sid) {
                return Err(StudyError::SubjectNotFound(sid));
            }
        }

        let mistake = Mistake {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            question_images: draft.question_images.clone(),
            analysis_image: draft.analysis_image.clone(),
            analysis_text: draft.analysis_text.clone().filter(|t| !t.trim().is_empty()),
            reflection: draft.reflection.clone(),
            created_at: Utc::now(),
            subject_id: draft.subject_id,
            review_logs: Vec::new(),
            is_mastered: false,
        };

        let mut mistakes = self.backend.load_mistakes()?;
        mistakes.insert(mistake.id, mistake.clone());
        self.backend.save_mistakes(&mistakes)?;

        info!(mistake = %mistake.id, "recorded mistake");
        Ok(mistake)
    }

    fn get_mistake(&self, id: &Uuid) -> Result<Mistake> {
        let mistakes = self.backend.load_mistakes()?;
        mistakes.get(id).cloned().ok_or(StudyError::MistakeNotFound(*id))
    }

    fn update_mistake(&mut self, mistake: &Mistake) -> Result<()> {
        MistakeDraft::from_mistake(mistake).validate()?;
        if let Some(sid) = mistake.subject_id {
            if !self.backend.load_subjects()?.contains_key(&sid) {
                return Err(StudyError::SubjectNotFound(sid));
            }
        }

        let mut mistakes = self.backend.load_mistakes()?;
        if !mistakes.contains_key(&mistake.id) {
            return Err(StudyError::MistakeNotFound(mistake.id));
        }
        mistakes.insert(mistake.id, mistake.clone());
        self.backend.save_mistakes(&mistakes)
    }

    fn delete_mistake(&mut self, id: &Uuid) -> Result<()> {
        let mut mistakes = self.backend.load_mistakes()?;
        if mistakes.remove(id).is_none() {
            return Err(StudyError::MistakeNotFound(*id));
        }
        self.backend.save_mistakes(&mistakes)
    }

    fn list_mistakes(&self, subject: Option<Uuid>) -> Result<Vec<Mistake>> {
        let mut mistakes: Vec<Mistake> = self
            .backend
            .load_mistakes()?
            .into_values()
            .filter(|m| subject.is_none() || m.subject_id == subject)
            .collect();
        mistakes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(mistakes)
    }

    fn add_subject(&mut self, name: &str) -> Result<Subject> {
        let name = normalize_subject_name(name)?;
        let mut subjects = self.backend.load_subjects()?;
        ensure_unique_name(&subjects, &name, None)?;

        let subject = Subject {
            id: Uuid::new_v4(),
            name,
        };
        subjects.insert(subject.id, subject.clone());
        self.backend.save_subjects(&subjects)?;

        info!(subject = %subject.id, name = %subject.name, "added subject");
        Ok(subject)
    }

    fn get_subject(&self, id: &Uuid) -> Result<Subject> {
        let subjects = self.backend.load_subjects()?;
        subjects.get(id).cloned().ok_or(StudyError::SubjectNotFound(*id))
    }

    fn update_subject(&mut self, subject: &Subject) -> Result<()> {
        let name = normalize_subject_name(&subject.name)?;
        let mut subjects = self.backend.load_subjects()?;
        if !subjects.contains_key(&subject.id) {
            return Err(StudyError::SubjectNotFound(subject.id));
        }
        ensure_unique_name(&subjects, &name, Some(subject.id))?;

        subjects.insert(
            subject.id,
            Subject {
                id: subject.id,
                name,
            },
        );
        self.backend.save_subjects(&subjects)
    }

    fn delete_subject(&mut self, id: &Uuid) -> Result<()> {
        let mut subjects = self.backend.load_subjects()?;
        let subject = subjects.get(id).ok_or(StudyError::SubjectNotFound(*id))?;

        let in_use = self
            .backend
            .load_mistakes()?
            .values()
            .filter(|m| m.subject_id == Some(*id))
            .count();
        if in_use > 0 {
            return Err(StudyError::Validation(format!(
                "Subject '{}' still has {} mistake(s)",
                subject.name, in_use
            )));
        }

        subjects.remove(id);
        self.backend.save_subjects(&subjects)
    }

    fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self.backend.load_subjects()?.into_values().collect();
        subjects.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(subjects)
    }

    fn doctor(&mut self) -> Result<DoctorReport> {
        self.reconcile()
    }
}
