//! # Domain Model
//!
//! Core records of the notebook: the note-tree [`Node`], the [`Mistake`] entry and the
//! [`Subject`] that partitions mistakes.
//!
//! ## Nodes
//!
//! A node is either a folder or a file. Instead of one loose record where half the fields
//! only make sense for one variant, the variant lives in [`NodeKind`]:
//!
//! ```text
//! Node { id, parentId, title, order, createdAt, type: "folder" }
//! Node { id, parentId, title, order, createdAt, type: "file", content, text, tags }
//! ```
//!
//! The on-disk JSON keeps the flat shape (the tag is the `type` field), so records stay
//! readable by anything that already understands the notes collection.
//!
//! ## The Root Sentinel
//!
//! Top-level nodes have `parentId = "root"`. [`Parent`] models this as an enum, and
//! (de)serializes it as either the literal `"root"` or the parent's UUID string.
//!
//! ## Ordering
//!
//! `order` is a plain `i64` sort key. It only has meaning among siblings, and values are
//! not required to be contiguous: new nodes get a timestamp-derived value, reorders
//! renumber the affected sibling group.
//!
//! ## Mistakes and Review State
//!
//! Review state is tracked with two independent fields: `review_logs` (one entry per
//! calendar day on which the analysis was revealed) and `is_mastered`. See
//! [`Mistake::record_review`] and [`Mistake::review_count`].

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, StudyError};

pub const ROOT_SENTINEL: &str = "root";

/// Reference to a node's owner: the sentinel root or another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Parent {
    #[default]
    Root,
    Node(Uuid),
}

impl Parent {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Parent::Root => None,
            Parent::Node(id) => Some(*id),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Parent::Root)
    }
}

impl From<Uuid> for Parent {
    fn from(id: Uuid) -> Self {
        Parent::Node(id)
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Root => write!(f, "{}", ROOT_SENTINEL),
            Parent::Node(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for Parent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == ROOT_SENTINEL {
            return Ok(Parent::Root);
        }
        Uuid::parse_str(s)
            .map(Parent::Node)
            .map_err(|e| format!("Invalid parent reference '{}': {}", s, e))
    }
}

impl Serialize for Parent {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Parent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An image attached to a file node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    /// Inline `data:` URL.
    pub image_data: String,
    #[serde(default)]
    pub description: String,
}

impl Attachment {
    pub fn new(image_data: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_data,
            description,
        }
    }
}

/// Fields that only exist on file nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileBody {
    #[serde(default)]
    pub content: Vec<Attachment>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File(FileBody),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File(_) => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: Uuid,
    pub parent_id: Parent,
    pub title: String,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn file_body(&self) -> Option<&FileBody> {
        match &self.kind {
            NodeKind::File(body) => Some(body),
            NodeKind::Folder => None,
        }
    }

    /// Mutable access to the file fields.
    ///
    /// Fails with a validation error on folders: a node's type is fixed at creation,
    /// so file-only edits can never turn a folder into something else.
    pub fn file_body_mut(&mut self) -> Result<&mut FileBody> {
        match &mut self.kind {
            NodeKind::File(body) => Ok(body),
            NodeKind::Folder => Err(StudyError::Validation(format!(
                "'{}' is a folder; only files hold text, tags and images",
                self.title
            ))),
        }
    }

    pub fn draft_copy(&self, parent_id: Parent, title: String, order: i64) -> NodeDraft {
        NodeDraft {
            parent_id,
            title,
            order,
            kind: self.kind.clone(),
        }
    }
}

/// A node that has not been stored yet. The store mints `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDraft {
    pub parent_id: Parent,
    pub title: String,
    pub order: i64,
    pub kind: NodeKind,
}

impl NodeDraft {
    pub fn folder(parent_id: Parent, title: impl Into<String>) -> Self {
        Self {
            parent_id,
            title: title.into(),
            order: 0,
            kind: NodeKind::Folder,
        }
    }

    pub fn file(parent_id: Parent, title: impl Into<String>) -> Self {
        Self {
            parent_id,
            title: title.into(),
            order: 0,
            kind: NodeKind::File(FileBody::default()),
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        if let NodeKind::File(body) = &mut self.kind {
            body.text = Some(text.into());
        }
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let NodeKind::File(body) = &mut self.kind {
            body.tags = tags.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StudyError::Validation("Title cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
}

/// Coarse review state derived from `review_logs` and `is_mastered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewState {
    Unreviewed,
    ReviewedToday,
    Reviewed,
    Mastered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mistake {
    pub id: Uuid,
    pub title: String,
    pub question_images: Vec<String>,
    pub analysis_image: Option<String>,
    pub analysis_text: Option<String>,
    pub reflection: String,
    pub created_at: DateTime<Utc>,
    pub subject_id: Option<Uuid>,
    pub review_logs: Vec<DateTime<Utc>>,
    pub is_mastered: bool,
}

// Records written before multi-image support carry a single `questionImg`, and records
// older than the review feature have no `reviewLogs` / `isMastered`. Both shapes load into
// the current struct; the schema upgrade then persists them in the new shape.
impl<'de> Deserialize<'de> for Mistake {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let helper = MistakeHelper::deserialize(deserializer)?;

        let mut question_images = helper.question_images.unwrap_or_default();
        if question_images.is_empty() {
            if let Some(legacy) = helper.question_img {
                question_images.push(legacy);
            }
        }

        Ok(Mistake {
            id: helper.id,
            title: helper.title,
            question_images,
            analysis_image: helper.analysis_image.filter(|i| !i.is_empty()),
            analysis_text: helper.analysis_text.filter(|t| !t.is_empty()),
            reflection: helper.reflection,
            created_at: helper.created_at,
            subject_id: helper.subject_id,
            review_logs: helper.review_logs,
            is_mastered: helper.is_mastered,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MistakeHelper {
    id: Uuid,
    #[serde(default)]
    title: String,
    #[serde(default)]
    question_images: Option<Vec<String>>,
    #[serde(default)]
    question_img: Option<String>,
    #[serde(default, alias = "analysisImg")]
    analysis_image: Option<String>,
    #[serde(default)]
    analysis_text: Option<String>,
    #[serde(default)]
    reflection: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    subject_id: Option<Uuid>,
    #[serde(default)]
    review_logs: Vec<DateTime<Utc>>,
    #[serde(default)]
    is_mastered: bool,
}

/// Calendar day of a review timestamp, in the user's local time.
pub fn review_day(ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

impl Mistake {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled mistake"
        } else {
            &self.title
        }
    }

    /// Records that the analysis was revealed at `now`.
    ///
    /// Appends at most one entry per calendar day: returns `false` without touching the
    /// log when the latest entry already falls on `now`'s day.
    pub fn record_review(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        if let Some(last) = self.review_logs.last() {
            if review_day(last) == today {
                return false;
            }
        }
        self.review_logs.push(now.with_timezone(&Utc));
        true
    }

    /// Number of distinct calendar days present in the review log.
    pub fn review_count(&self) -> usize {
        self.review_logs
            .iter()
            .map(review_day)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn review_state(&self, today: NaiveDate) -> ReviewState {
        if self.is_mastered {
            return ReviewState::Mastered;
        }
        match self.review_logs.last() {
            None => ReviewState::Unreviewed,
            Some(last) if review_day(last) == today => ReviewState::ReviewedToday,
            Some(_) => ReviewState::Reviewed,
        }
    }
}

/// Form data for creating or editing a mistake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MistakeDraft {
    pub title: String,
    pub question_images: Vec<String>,
    pub analysis_image: Option<String>,
    pub analysis_text: Option<String>,
    pub reflection: String,
    pub subject_id: Option<Uuid>,
}

impl MistakeDraft {
    pub fn validate(&self) -> Result<()> {
        if self.question_images.is_empty() {
            return Err(StudyError::Validation(
                "A mistake needs at least one question image".to_string(),
            ));
        }
        if self.question_images.iter().any(|img| img.trim().is_empty()) {
            return Err(StudyError::Validation(
                "Question images cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_mistake(mistake: &Mistake) -> Self {
        Self {
            title: mistake.title.clone(),
            question_images: mistake.question_images.clone(),
            analysis_image: mistake.analysis_image.clone(),
            analysis_text: mistake.analysis_text.clone(),
            reflection: mistake.reflection.clone(),
            subject_id: mistake.subject_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn sample_mistake() -> Mistake {
        Mistake {
            id: Uuid::new_v4(),
            title: "Derivative extremum".to_string(),
            question_images: vec!["data:image/png;base64,AAAA".to_string()],
            analysis_image: None,
            analysis_text: None,
            reflection: String::new(),
            created_at: Utc::now(),
            subject_id: None,
            review_logs: Vec::new(),
            is_mastered: false,
        }
    }

    #[test]
    fn parent_serializes_root_as_sentinel() {
        assert_eq!(serde_json::to_string(&Parent::Root).unwrap(), "\"root\"");
        let id = Uuid::new_v4();
        let json = serde_json::to_string(&Parent::Node(id)).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: Parent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Parent::Node(id));
    }

    #[test]
    fn parent_rejects_garbage() {
        assert!("not-a-uuid".parse::<Parent>().is_err());
        assert_eq!("root".parse::<Parent>().unwrap(), Parent::Root);
    }

    #[test]
    fn node_json_keeps_flat_shape() {
        let node = Node {
            id: Uuid::new_v4(),
            parent_id: Parent::Root,
            title: "Calculus".to_string(),
            order: 3,
            created_at: Utc::now(),
            kind: NodeKind::File(FileBody {
                text: Some("$x^2$".to_string()),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["parentId"], "root");
        assert_eq!(value["text"], "$x^2$");

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn folder_rejects_file_edits() {
        let mut node = Node {
            id: Uuid::new_v4(),
            parent_id: Parent::Root,
            title: "Folder".to_string(),
            order: 0,
            created_at: Utc::now(),
            kind: NodeKind::Folder,
        };
        assert!(matches!(
            node.file_body_mut(),
            Err(StudyError::Validation(_))
        ));
    }

    #[test]
    fn legacy_mistake_loads_single_image() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"id":"{}","title":"Old","questionImg":"data:image/png;base64,QQ==","analysisImg":"data:image/png;base64,Qg==","analysisText":"","reflection":"r","createdAt":"2023-05-01T08:00:00Z"}}"#,
            id
        );
        let mistake: Mistake = serde_json::from_str(&json).unwrap();
        assert_eq!(mistake.question_images, vec!["data:image/png;base64,QQ=="]);
        assert_eq!(
            mistake.analysis_image.as_deref(),
            Some("data:image/png;base64,Qg==")
        );
        assert_eq!(mistake.analysis_text, None);
        assert!(mistake.review_logs.is_empty());
        assert!(!mistake.is_mastered);
        assert_eq!(mistake.subject_id, None);
    }

    #[test]
    fn review_is_recorded_once_per_day() {
        let mut mistake = sample_mistake();
        assert!(mistake.record_review(local(2024, 1, 1, 9)));
        assert!(!mistake.record_review(local(2024, 1, 1, 21)));
        assert_eq!(mistake.review_logs.len(), 1);

        assert!(mistake.record_review(local(2024, 1, 2, 7)));
        assert_eq!(mistake.review_logs.len(), 2);
        assert_eq!(mistake.review_count(), 2);
    }

    #[test]
    fn review_count_ignores_duplicate_days() {
        let mut mistake = sample_mistake();
        let day = local(2024, 3, 5, 10).with_timezone(&Utc);
        mistake.review_logs = vec![day, day, day];
        assert_eq!(mistake.review_count(), 1);
    }

    #[test]
    fn review_state_transitions() {
        let mut mistake = sample_mistake();
        let today = local(2024, 1, 1, 12);
        assert_eq!(
            mistake.review_state(today.date_naive()),
            ReviewState::Unreviewed
        );

        mistake.record_review(today);
        assert_eq!(
            mistake.review_state(today.date_naive()),
            ReviewState::ReviewedToday
        );
        assert_eq!(
            mistake.review_state(local(2024, 1, 2, 12).date_naive()),
            ReviewState::Reviewed
        );

        mistake.is_mastered = true;
        assert_eq!(
            mistake.review_state(today.date_naive()),
            ReviewState::Mastered
        );
        assert_eq!(mistake.review_count(), 1);
    }

    #[test]
    fn draft_requires_question_image() {
        let draft = MistakeDraft::default();
        assert!(matches!(draft.validate(), Err(StudyError::Validation(_))));

        let draft = MistakeDraft {
            question_images: vec!["data:image/png;base64,AA==".to_string()],
            ..Default::default()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn node_draft_builders_only_touch_files() {
        let folder = NodeDraft::folder(Parent::Root, "F").with_text("ignored");
        assert_eq!(folder.kind, NodeKind::Folder);

        let file = NodeDraft::file(Parent::Root, "F").with_tags(["algebra", "limits"]);
        match file.kind {
            NodeKind::File(body) => assert_eq!(body.tags.len(), 2),
            NodeKind::Folder => panic!("expected a file"),
        }
    }
}
