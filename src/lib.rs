//! # Ideabox Architecture
//!
//! Ideabox is the **hierarchical-workspace core** of a dashboard backend: an
//! HTTP layer sits above it, a hosted document store below it, and this crate
//! is everything in between: the data model, the invariants, and the
//! mutation protocols that keep derived data honest on a store with no
//! transactions.
//!
//! ## The Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  HTTP layer (out of scope)                                   │
//! │  - Routing, validation middleware, auth, upload handling     │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  API facade (api.rs)                                         │
//! │  - Workspace<S>: resolves folder paths, dispatches to ops    │
//! │  - Holds the per-container repair lease                      │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Operations (ops/*.rs, path.rs)                              │
//! │  - Business logic: validation, counters, tag refcounts       │
//! │  - Ordered non-transactional write sequences                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Store layer (store/)                                        │
//! │  - StoreClient + BlobStore traits (external collaborators)   │
//! │  - InMemoryStore (tests, embedders)                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Rule
//!
//! Counters and tag counts are **derived data**. Only the entry manager and
//! the repair job may move them, and always through the same protocol:
//! primary record write first, then counter delta, then tag diff. Anything
//! else reads them at face value and tolerates staleness.
//!
//! ## Quick start
//!
//! ```no_run
//! use ideabox::model::EntryPayload;
//! use ideabox::ops::entries::NewEntry;
//! use ideabox::store::InMemoryStore;
//! use ideabox::Workspace;
//!
//! # async fn demo() -> ideabox::Result<()> {
//! let ws = Workspace::new(InMemoryStore::new());
//! let container = ws.create_container("Notes", "#336699", "box").await?;
//! let work = ws.create_folder(&container.id, "", "Work").await?;
//!
//! let entry = NewEntry::new(
//!     "Read the borrow checker chapter",
//!     EntryPayload::Text { content: "twice".into() },
//! )
//! .with_tags(&["rust", "reading"]);
//! ws.create_entry(&container.id, &[work.id.clone()], entry).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod path;
pub mod store;

pub use api::Workspace;
pub use config::WorkspaceConfig;
pub use error::{Result, WorkspaceError};
pub use model::{Container, Entry, EntryKind, EntryPayload, Folder, Tag};
