//! # Storage Layer
//!
//! This module defines the storage abstraction for studybook. The [`DataStore`] trait
//! is the "Node Store Adapter" the rest of the library talks to: CRUD over the three
//! collections plus the query the tree needs most, "children of parent X, sorted".
//!
//! ## Layers
//!
//! ```text
//! DataStore (trait)          what the commands call
//!   └── RecordStore<B>       id minting, queries, validation, doctor
//!         └── StorageBackend raw load/save of whole collections
//!               ├── MemBackend   RefCell maps, for tests
//!               └── FsBackend    one JSON file per collection
//! ```
//!
//! [`memory::InMemoryStore`] and [`fs::FileStore`] are the two concrete stores.
//!
//! ## Collections
//!
//! - `notes`: the note tree, keyed by node id. Queried by `parentId`, sorted by `order`.
//! - `mistakes`: listed newest first, optionally filtered by subject.
//! - `subjects`: flat list of named partitions for mistakes.
//!
//! Each collection is read and written whole, so every mutating call is a single
//! durable write. There is no cross-call transaction: a bulk operation that fails
//! halfway leaves the items it already wrote in place.
//!
//! ## Schema
//!
//! The stored layout is versioned. [`record_store::RecordStore::upgrade`] runs the
//! ordered steps from [`migrations`] that the data has not seen yet.

use crate::error::Result;
use crate::model::{Mistake, MistakeDraft, Node, NodeDraft, Parent, Subject};
use uuid::Uuid;

pub mod backend;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod migrations;
pub mod record_store;

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Nodes whose parent no longer existed, moved to the root.
    pub reattached_orphans: usize,
    /// Parent cycles broken by moving one of their nodes to the root.
    pub broken_cycles: usize,
    /// Mistakes pointing at a deleted subject, cleared to "no subject".
    pub cleared_subject_refs: usize,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        *self == DoctorReport::default()
    }
}

/// Abstract interface for the notebook's persistent records.
///
/// Mutating calls either succeed completely or leave the stored collection unchanged.
pub trait DataStore {
    // --- Notes ---

    /// Stores a new node, minting its id and creation time.
    fn add_node(&mut self, draft: NodeDraft) -> Result<Node>;

    fn get_node(&self, id: &Uuid) -> Result<Node>;

    fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Replaces a stored node. The node must exist and keep its type.
    fn update_node(&mut self, node: &Node) -> Result<()>;

    /// Removes a single node. Children are not touched; see `commands::delete`.
    fn delete_node(&mut self, id: &Uuid) -> Result<()>;

    /// Children of `parent`, sorted by order (then creation time, then id).
    fn children_of(&self, parent: Parent) -> Result<Vec<Node>>;

    // --- Mistakes ---

    fn add_mistake(&mut self, draft: &MistakeDraft) -> Result<Mistake>;

    fn get_mistake(&self, id: &Uuid) -> Result<Mistake>;

    fn update_mistake(&mut self, mistake: &Mistake) -> Result<()>;

    fn delete_mistake(&mut self, id: &Uuid) -> Result<()>;

    /// Newest first. `Some(subject)` keeps only mistakes in that subject.
    fn list_mistakes(&self, subject: Option<Uuid>) -> Result<Vec<Mistake>>;

    // --- Subjects ---

    fn add_subject(&mut self, name: &str) -> Result<Subject>;

    fn get_subject(&self, id: &Uuid) -> Result<Subject>;

    fn update_subject(&mut self, subject: &Subject) -> Result<()>;

    fn delete_subject(&mut self, id: &Uuid) -> Result<()>;

    /// Sorted by name.
    fn list_subjects(&self) -> Result<Vec<Subject>>;

    // --- Maintenance ---

    /// Verify and fix consistency issues
    fn doctor(&mut self) -> Result<DoctorReport>;
}
