//! # API Facade
//!
//! [`Workspace`] is the single entry point the HTTP layer talks to. It is a
//! **thin facade**: it resolves folder paths into cursors, dispatches to the
//! operation modules, and owns the per-container repair lease. No business
//! logic lives here.
//!
//! Generic over [`StoreClient`], so production wires a real document-store
//! client and tests run against [`crate::store::InMemoryStore`]. All methods
//! take `&self`; one `Workspace` is shared across request workers.
//!
//! Callers are assumed to be authorized for every container they name;
//! authorization is the HTTP layer's problem.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::config::WorkspaceConfig;
use crate::error::{Result, WorkspaceError};
use crate::model::{Container, Entry, Folder, Tag};
use crate::ops::browse::FolderListing;
use crate::ops::containers::ContainerUpdate;
use crate::ops::entries::{EntryUpdate, NewEntry};
use crate::ops::folders::FolderUpdate;
use crate::ops::repair::RepairReport;
use crate::ops::search::{SearchHit, SearchQuery};
use crate::ops::{browse, containers, entries, folders, repair, search, tags};
use crate::path;
use crate::store::{BlobStore, StoreClient};

pub struct Workspace<S: StoreClient> {
    store: S,
    config: WorkspaceConfig,
    /// Containers with a repair currently running (single-flight lease).
    repairs: Mutex<HashSet<String>>,
}

impl<S: StoreClient> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, WorkspaceConfig::default())
    }

    pub fn with_config(store: S, config: WorkspaceConfig) -> Self {
        Self {
            store,
            config,
            repairs: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    // --- Containers ---

    pub async fn create_container(&self, name: &str, color: &str, icon: &str) -> Result<Container> {
        containers::create(&self.store, name, color, icon).await
    }

    pub async fn container(&self, id: &str) -> Result<Container> {
        containers::get(&self.store, id).await
    }

    pub async fn containers(&self) -> Result<Vec<Container>> {
        containers::list(&self.store).await
    }

    pub async fn update_container(&self, id: &str, changes: ContainerUpdate) -> Result<Container> {
        containers::update(&self.store, id, changes).await
    }

    pub async fn delete_container(&self, id: &str) -> Result<()> {
        containers::delete(&self.store, id).await
    }

    pub async fn upload_cover<B: BlobStore>(
        &self,
        blobs: &B,
        id: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<Container> {
        containers::upload_cover(&self.store, blobs, id, filename, data).await
    }

    // --- Folders ---

    pub async fn create_folder(&self, container: &str, parent: &str, name: &str) -> Result<Folder> {
        folders::create(&self.store, container, parent, name).await
    }

    pub async fn folder(&self, id: &str) -> Result<Folder> {
        folders::get(&self.store, id).await
    }

    pub async fn update_folder(&self, id: &str, changes: FolderUpdate) -> Result<Folder> {
        folders::update(&self.store, id, changes).await
    }

    pub async fn move_folder(&self, id: &str, new_parent: &str) -> Result<Folder> {
        folders::move_folder(&self.store, id, new_parent, self.config.max_path_depth).await
    }

    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        folders::delete(&self.store, id).await
    }

    // --- Paths & tree ---

    /// Validate a folder-id path and return the deepest cursor.
    pub async fn resolve_path(&self, container: &str, segments: &[String]) -> Result<String> {
        path::resolve(&self.store, container, segments, self.config.max_path_depth).await
    }

    /// Resolve `segments` and list the folders and entries at the cursor.
    pub async fn list_children(&self, container: &str, segments: &[String]) -> Result<FolderListing> {
        let cursor = self.resolve_path(container, segments).await?;
        browse::list_children(&self.store, container, &cursor).await
    }

    /// Resolve `segments` and search the whole subtree below the cursor.
    pub async fn search(
        &self,
        container: &str,
        segments: &[String],
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>> {
        let cursor = self.resolve_path(container, segments).await?;
        search::search_subtree(
            &self.store,
            container,
            &cursor,
            query,
            self.config.search_fanout(),
        )
        .await
    }

    // --- Entries ---

    /// Resolve `segments` and create the entry at the cursor.
    pub async fn create_entry(
        &self,
        container: &str,
        segments: &[String],
        new: NewEntry,
    ) -> Result<Entry> {
        let cursor = self.resolve_path(container, segments).await?;
        entries::create(&self.store, container, &cursor, new).await
    }

    pub async fn entry(&self, id: &str) -> Result<Entry> {
        entries::get(&self.store, id).await
    }

    pub async fn update_entry(&self, id: &str, changes: EntryUpdate) -> Result<Entry> {
        entries::update(&self.store, id, changes).await
    }

    pub async fn delete_entry(&self, id: &str) -> Result<Entry> {
        entries::delete(&self.store, id).await
    }

    pub async fn set_entry_pinned(&self, id: &str, pinned: bool) -> Result<Entry> {
        entries::set_pinned(&self.store, id, pinned).await
    }

    pub async fn set_entry_archived(&self, id: &str, archived: bool) -> Result<Entry> {
        entries::set_archived(&self.store, id, archived).await
    }

    pub async fn move_entry(&self, id: &str, target_folder: &str) -> Result<Entry> {
        entries::move_entry(&self.store, id, target_folder).await
    }

    pub async fn remove_entry_from_folder(&self, id: &str) -> Result<Entry> {
        entries::remove_from_folder(&self.store, id).await
    }

    // --- Tags ---

    pub async fn tags(&self, container: &str) -> Result<Vec<Tag>> {
        tags::list(&self.store, container).await
    }

    // --- Repair ---

    /// Recompute a container's counters and tag rows from a full scan.
    ///
    /// Single-flight per container: a second call while one is running is
    /// rejected with [`WorkspaceError::RepairInProgress`] instead of queuing
    /// a redundant scan.
    pub async fn rebuild_aggregates(&self, container: &str) -> Result<RepairReport> {
        {
            let mut leases = self.repairs.lock().await;
            if !leases.insert(container.to_string()) {
                return Err(WorkspaceError::RepairInProgress(container.to_string()));
            }
        }

        let result = repair::rebuild_aggregates(&self.store, container).await;

        self.repairs.lock().await.remove(container);
        result
    }
}
