use super::{CmdMessage, CmdResult};
use crate::error::{Result, StudyError};
use crate::model::Subject;
use crate::store::DataStore;

/// Finds a subject by exact (case-insensitive) name.
pub fn find_by_name<S: DataStore>(store: &S, name: &str) -> Result<Subject> {
    let wanted = name.trim();
    store
        .list_subjects()?
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| StudyError::Api(format!("No subject named \"{}\"", wanted)))
}

pub fn add<S: DataStore>(store: &mut S, name: &str) -> Result<CmdResult> {
    let subject = store.add_subject(name)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Added subject {}", subject.name)));
    Ok(result.with_subjects(vec![subject]))
}

pub fn list<S: DataStore>(store: &S) -> Result<CmdResult> {
    Ok(CmdResult::default().with_subjects(store.list_subjects()?))
}

pub fn rename<S: DataStore>(store: &mut S, name: &str, new_name: &str) -> Result<CmdResult> {
    let mut subject = find_by_name(store, name)?;
    let old = std::mem::replace(&mut subject.name, new_name.to_string());
    store.update_subject(&subject)?;

    let subject = store.get_subject(&subject.id)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Renamed subject {} to {}",
        old, subject.name
    )));
    Ok(result.with_subjects(vec![subject]))
}

pub fn delete<S: DataStore>(store: &mut S, name: &str) -> Result<CmdResult> {
    let subject = find_by_name(store, name)?;
    store.delete_subject(&subject.id)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Deleted subject {}",
        subject.name
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MistakeDraft;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn add_list_rename() {
        let mut store = InMemoryStore::new();
        add(&mut store, "physics").unwrap();
        add(&mut store, "Biology").unwrap();

        let names: Vec<String> = list(&store)
            .unwrap()
            .subjects
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Biology", "physics"]);

        rename(&mut store, "PHYSICS", " Physics ").unwrap();
        assert_eq!(find_by_name(&store, "physics").unwrap().name, "Physics");
    }

    #[test]
    fn delete_refuses_subject_in_use() {
        let mut store = InMemoryStore::new();
        add(&mut store, "History").unwrap();
        let history = find_by_name(&store, "history").unwrap();
        store
            .add_mistake(&MistakeDraft {
                question_images: vec!["data:image/png;base64,AA==".into()],
                subject_id: Some(history.id),
                ..Default::default()
            })
            .unwrap();

        assert!(matches!(
            delete(&mut store, "History"),
            Err(StudyError::Validation(_))
        ));
        assert!(delete(&mut store, "Geography").is_err());
    }
}
