use super::mem_backend::MemBackend;
use super::record_store::RecordStore;

pub type InMemoryStore = RecordStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        RecordStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{MistakeDraft, Node, NodeDraft, Parent};
    use crate::store::DataStore;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Builds a note tree by title so tests can refer to nodes by name.
    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub ids: HashMap<String, Uuid>,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
                ids: HashMap::new(),
            }
        }

        fn parent_ref(&self, parent: Option<&str>) -> Parent {
            match parent {
                None => Parent::Root,
                Some(title) => Parent::Node(self.id(title)),
            }
        }

        fn next_order(&self, parent: Parent) -> i64 {
            self.store
                .children_of(parent)
                .unwrap()
                .iter()
                .map(|n| n.order + 1)
                .max()
                .unwrap_or(0)
        }

        pub fn with_folder(mut self, title: &str, parent: Option<&str>) -> Self {
            let parent = self.parent_ref(parent);
            let order = self.next_order(parent);
            let node = self
                .store
                .add_node(NodeDraft::folder(parent, title).with_order(order))
                .unwrap();
            self.ids.insert(title.to_string(), node.id);
            self
        }

        pub fn with_file(mut self, title: &str, parent: Option<&str>) -> Self {
            let parent = self.parent_ref(parent);
            let order = self.next_order(parent);
            let node = self
                .store
                .add_node(
                    NodeDraft::file(parent, title)
                        .with_order(order)
                        .with_text(format!("Notes for {}", title)),
                )
                .unwrap();
            self.ids.insert(title.to_string(), node.id);
            self
        }

        pub fn with_mistakes(mut self, count: usize) -> Self {
            for i in 0..count {
                let draft = MistakeDraft {
                    title: format!("Mistake {}", i + 1),
                    question_images: vec!["data:image/png;base64,AAAA".to_string()],
                    ..Default::default()
                };
                self.store.add_mistake(&draft).unwrap();
            }
            self
        }

        pub fn id(&self, title: &str) -> Uuid {
            *self
                .ids
                .get(title)
                .unwrap_or_else(|| panic!("fixture has no node titled {}", title))
        }

        pub fn node(&self, title: &str) -> Node {
            self.store.get_node(&self.id(title)).unwrap()
        }

        /// Titles of `parent`'s children in display order.
        pub fn child_titles(&self, parent: Option<&str>) -> Vec<String> {
            self.store
                .children_of(self.parent_ref(parent))
                .unwrap()
                .into_iter()
                .map(|n| n.title)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use crate::store::DataStore;

    #[test]
    fn test_fixture_builds_nested_tree() {
        let fixture = StoreFixture::new()
            .with_folder("Math", None)
            .with_file("Limits", Some("Math"))
            .with_file("Series", Some("Math"))
            .with_mistakes(2);

        assert_eq!(fixture.child_titles(None), vec!["Math"]);
        assert_eq!(fixture.child_titles(Some("Math")), vec!["Limits", "Series"]);
        assert_eq!(fixture.store.list_mistakes(None).unwrap().len(), 2);
    }
}
