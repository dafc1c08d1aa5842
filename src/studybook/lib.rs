//! # Studybook Architecture
//!
//! Studybook is a **local-first study notebook library**: a mistake log (problems you
//! got wrong, with images, a reflection and the solution) and a notes tree you can
//! reorganize freely. The terminal client in `cli/` is one consumer of it; nothing from
//! `api.rs` inward assumes a terminal.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prompts, formats output                │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, owns AppState                 │
//! │  - Normalizes inputs (display paths → UUIDs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs) + core units                 │
//! │  - tree, clipboard, gesture timers, offline cache           │
//! │  - Operates on Rust types, returns Rust types               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait over RecordStore<Backend>                │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Note Tree
//!
//! Notes are stored flat: each record names its parent (or the root) and carries a
//! numeric order among its siblings. The nested view is rebuilt on every read by
//! [`tree::build_tree`]. Every operation that changes a parent goes through the cycle
//! guard in [`commands::guard`], so the stored graph stays a forest.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command family
//! - [`store`]: Storage abstraction, backends and schema upgrades
//! - [`model`]: Core records (`Node`, `Mistake`, `Subject`)
//! - [`tree`]: Flat records to nested tree
//! - [`index`]: Display paths (`1.2`) and list positions
//! - [`clipboard`]: Copy/cut/paste of subtrees
//! - [`gesture`]: Hover-to-expand and long-press timers
//! - [`offline`]: Shell cache contract and app manifest
//! - [`media`]: Inline image data URLs
//! - [`state`]: Persisted application state
//! - [`config`]: Configuration management
//! - [`init`]: Data directory discovery and store setup
//! - [`error`]: Error types
//! - `cli`: Argument parsing, prompts and printing for the binary (not part of the lib API)

pub mod api;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod gesture;
pub mod index;
pub mod init;
pub mod media;
pub mod model;
pub mod offline;
pub mod state;
pub mod store;
pub mod tree;
