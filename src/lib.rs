//! atlas-sync - collaborative synchronization layer for Atlas domain maps
//!
//! Multiple editors concurrently modify a shared project model (bounded
//! contexts, relationships, teams, user needs) without a central lock.
//! Concurrent edits merge deterministically through a replicated document,
//! referential integrity is enforced by cascading deletes, and undo/redo
//! rides on the document's operation history.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ProjectStore (facade)                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  model     - plain domain entities (Project, BoundedContext, …)  │
//! │  doc/codec - entity <-> replicated-container mapping             │
//! │  ops       - mutation operations + cascading integrity           │
//! │  observer  - one decoded snapshot callback per transaction       │
//! │  undo      - history over the document's operation log           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Merge semantics come entirely from the substrate: leaf writes resolve by
//! its deterministic last-writer-wins rule, sequence insertions interleave
//! deterministically and never vanish. This crate issues operations against
//! those guarantees; it implements no merge algebra of its own. Transport
//! of update bytes between replicas and persistent storage of snapshots are
//! external concerns; see [`ProjectStore::export_all_updates`] and
//! [`ProjectStore::import_updates`] for the exchange surface.

pub mod doc;
pub mod error;
pub mod model;
pub mod observer;
pub mod ops;
pub mod snapshot;
pub mod store;
pub mod undo;

pub use error::SyncError;
pub use model::Project;
pub use observer::{ChangeCallback, ChangeObserver};
pub use store::{ProjectStore, StoreConfig};
pub use undo::HistoryManager;
