//! Mistake notebook commands.
//!
//! Mistakes are addressed by their position in the full newest-first list. Subject
//! filters narrow what is listed but never renumber it.

use super::helpers::{display_mistake, indexed_mistakes, resolve_mistakes, subject_names, to_display_mistake};
use super::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Mistake, MistakeDraft};
use crate::store::DataStore;
use chrono::{DateTime, Local};
use tracing::info;
use uuid::Uuid;

/// Records a new mistake. The draft is borrowed so a failed save leaves it with the caller.
pub fn add<S: DataStore>(store: &mut S, draft: &MistakeDraft) -> Result<CmdResult> {
    let mistake = store.add_mistake(draft)?;
    let index = position_of(store, mistake.id)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Recorded mistake {}: {}",
        index,
        mistake.display_title()
    )));
    result.mistakes.push(display_mistake(store, index, mistake)?);
    Ok(result)
}

/// Replaces the editable fields of the mistake at `index`. Review history is kept.
pub fn edit<S: DataStore>(store: &mut S, index: usize, draft: &MistakeDraft) -> Result<CmdResult> {
    draft.validate()?;
    let (_, mut mistake) = single(store, index)?;

    mistake.title = draft.title.trim().to_string();
    mistake.question_images = draft.question_images.clone();
    mistake.analysis_image = draft.analysis_image.clone();
    mistake.analysis_text = draft.analysis_text.clone().filter(|t| !t.trim().is_empty());
    mistake.reflection = draft.reflection.clone();
    mistake.subject_id = draft.subject_id;
    store.update_mistake(&mistake)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Updated mistake {}: {}",
        index,
        mistake.display_title()
    )));
    result.mistakes.push(display_mistake(store, index, mistake)?);
    Ok(result)
}

/// Lists mistakes newest first, optionally only those in `subject`.
pub fn list<S: DataStore>(store: &S, subject: Option<Uuid>) -> Result<CmdResult> {
    if let Some(sid) = subject {
        store.get_subject(&sid)?;
    }
    let names = subject_names(store)?;
    let listed = indexed_mistakes(store)?
        .into_iter()
        .filter(|(_, m)| subject.is_none() || m.subject_id == subject)
        .map(|(i, m)| to_display_mistake(&names, i, m))
        .collect();
    Ok(CmdResult::default().with_mistakes(listed))
}

pub fn show<S: DataStore>(store: &S, indexes: &[usize]) -> Result<CmdResult> {
    let names = subject_names(store)?;
    let listed = resolve_mistakes(store, indexes)?
        .into_iter()
        .map(|(i, m)| to_display_mistake(&names, i, m))
        .collect();
    Ok(CmdResult::default().with_mistakes(listed))
}

/// Reveals the analysis of a mistake, logging at most one review per calendar day.
pub fn reveal<S: DataStore>(store: &mut S, index: usize, now: DateTime<Local>) -> Result<CmdResult> {
    let (_, mut mistake) = single(store, index)?;

    let mut result = CmdResult::default();
    if mistake.record_review(now) {
        store.update_mistake(&mistake)?;
        info!(mistake = %mistake.id, reviews = mistake.review_count(), "logged review");
        result.add_message(CmdMessage::info(format!(
            "Review {} logged",
            mistake.review_count()
        )));
    }
    result.mistakes.push(display_mistake(store, index, mistake)?);
    Ok(result)
}

pub fn toggle_mastered<S: DataStore>(store: &mut S, index: usize) -> Result<CmdResult> {
    let (_, mut mistake) = single(store, index)?;
    mistake.is_mastered = !mistake.is_mastered;
    store.update_mistake(&mistake)?;

    let mut result = CmdResult::default();
    let state = if mistake.is_mastered {
        "mastered"
    } else {
        "not mastered"
    };
    result.add_message(CmdMessage::success(format!(
        "Marked {} as {}",
        mistake.display_title(),
        state
    )));
    result.mistakes.push(display_mistake(store, index, mistake)?);
    Ok(result)
}

/// Mistakes a delete of `indexes` would remove. For the confirmation prompt.
pub fn preview_delete<S: DataStore>(store: &S, indexes: &[usize]) -> Result<Vec<(usize, Mistake)>> {
    resolve_mistakes(store, indexes)
}

pub fn delete<S: DataStore>(store: &mut S, indexes: &[usize]) -> Result<CmdResult> {
    let targets = resolve_mistakes(store, indexes)?;
    let mut result = CmdResult::default();
    for (index, mistake) in targets {
        store.delete_mistake(&mistake.id)?;
        result.add_message(CmdMessage::success(format!(
            "Deleted mistake {}: {}",
            index,
            mistake.display_title()
        )));
    }
    Ok(result)
}

fn single<S: DataStore>(store: &S, index: usize) -> Result<(usize, Mistake)> {
    let mut resolved = resolve_mistakes(store, &[index])?;
    // resolve_mistakes errors on a missing index, so exactly one entry is present
    Ok(resolved.remove(0))
}

fn position_of<S: DataStore>(store: &S, id: Uuid) -> Result<usize> {
    Ok(indexed_mistakes(store)?
        .into_iter()
        .find(|(_, m)| m.id == id)
        .map_or(0, |(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use crate::model::ReviewState;
    use crate::store::memory::InMemoryStore;
    use chrono::TimeZone;

    fn draft(title: &str) -> MistakeDraft {
        MistakeDraft {
            title: title.to_string(),
            question_images: vec!["data:image/png;base64,AAAA".to_string()],
            ..Default::default()
        }
    }

    fn day(d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    #[test]
    fn add_requires_image_and_keeps_draft() {
        let mut store = InMemoryStore::new();
        let empty = MistakeDraft {
            title: "No picture".into(),
            ..Default::default()
        };
        assert!(matches!(add(&mut store, &empty), Err(StudyError::Validation(_))));
        assert_eq!(empty.title, "No picture");
        assert!(store.list_mistakes(None).unwrap().is_empty());
    }

    #[test]
    fn failed_save_leaves_draft_with_caller() {
        let mut store = InMemoryStore::new();
        store.backend.set_quota(Some(32));
        let big = draft("A title long enough to blow the tiny quota");

        let err = add(&mut store, &big).unwrap_err();
        assert!(err.is_write_failure());
        assert_eq!(big.question_images.len(), 1);
    }

    #[test]
    fn newest_is_index_one() {
        let mut store = InMemoryStore::new();
        add(&mut store, &draft("old")).unwrap();
        let result = add(&mut store, &draft("new")).unwrap();
        assert_eq!(result.mistakes[0].index, 1);

        let listed = list(&store, None).unwrap().mistakes;
        assert_eq!(listed[0].mistake.title, "new");
        assert_eq!(listed[1].mistake.title, "old");
    }

    #[test]
    fn reveal_twice_same_day_logs_once() {
        let mut store = InMemoryStore::new();
        add(&mut store, &draft("Integrals")).unwrap();

        reveal(&mut store, 1, day(1, 9)).unwrap();
        let result = reveal(&mut store, 1, day(1, 18)).unwrap();
        assert!(result.messages.is_empty());
        assert_eq!(result.mistakes[0].mistake.review_logs.len(), 1);

        let result = reveal(&mut store, 1, day(2, 9)).unwrap();
        assert_eq!(result.mistakes[0].mistake.review_logs.len(), 2);
        assert_eq!(result.mistakes[0].review_count, 2);
    }

    #[test]
    fn mastered_toggles_independently_of_reviews() {
        let mut store = InMemoryStore::new();
        add(&mut store, &draft("Vectors")).unwrap();
        reveal(&mut store, 1, day(1, 9)).unwrap();

        let result = toggle_mastered(&mut store, 1).unwrap();
        assert_eq!(result.mistakes[0].state, ReviewState::Mastered);
        assert_eq!(result.mistakes[0].review_count, 1);

        let result = toggle_mastered(&mut store, 1).unwrap();
        assert!(!result.mistakes[0].mistake.is_mastered);
        assert_eq!(result.mistakes[0].mistake.review_logs.len(), 1);
    }

    #[test]
    fn edit_keeps_review_history() {
        let mut store = InMemoryStore::new();
        add(&mut store, &draft("Typo")).unwrap();
        reveal(&mut store, 1, day(3, 9)).unwrap();

        let mut changed = draft("Fixed title");
        changed.reflection = "Read the question twice".into();
        edit(&mut store, 1, &changed).unwrap();

        let m = &show(&store, &[1]).unwrap().mistakes[0].mistake;
        assert_eq!(m.title, "Fixed title");
        assert_eq!(m.reflection, "Read the question twice");
        assert_eq!(m.review_logs.len(), 1);
    }

    #[test]
    fn list_filters_by_subject_without_renumbering() {
        let mut store = InMemoryStore::new();
        let chem = store.add_subject("Chemistry").unwrap();
        let mut in_chem = draft("Moles");
        in_chem.subject_id = Some(chem.id);
        add(&mut store, &in_chem).unwrap();
        add(&mut store, &draft("Unfiled")).unwrap();

        let listed = list(&store, Some(chem.id)).unwrap().mistakes;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].index, 2);
        assert_eq!(listed[0].subject_name.as_deref(), Some("Chemistry"));
    }

    #[test]
    fn delete_by_index_range() {
        let mut store = InMemoryStore::new();
        for title in ["a", "b", "c"] {
            add(&mut store, &draft(title)).unwrap();
        }
        assert_eq!(preview_delete(&store, &[1, 2]).unwrap().len(), 2);
        delete(&mut store, &[1, 2]).unwrap();

        let left = store.list_mistakes(None).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "a");
        assert!(delete(&mut store, &[7]).is_err());
    }
}
