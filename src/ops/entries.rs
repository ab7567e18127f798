//! # Entry Manager
//!
//! Create, update and delete leaf entries, keeping the container's per-type
//! counters and the tag index in step.
//!
//! Every mutation is an ordered, non-transactional sequence: the entry write
//! lands first, then the counter delta, then the tag diff. A failure after
//! the entry write propagates to the caller and leaves the aggregates stale;
//! they are derived data and [`crate::ops::repair`] can recompute them.
//!
//! Folder membership is independent of type/tag accounting: [`move_entry`]
//! and [`remove_from_folder`] rewrite only the `folder` field and never
//! touch counters or tags.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, WorkspaceError};
use crate::model::{collections, Entry, EntryPayload, Folder};
use crate::ops::{containers, tags};
use crate::store::{decode, encode, StoreClient};

/// Input for [`create`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub payload: EntryPayload,
    pub tags: Vec<String>,
    pub pinned: bool,
}

impl NewEntry {
    pub fn new(title: impl Into<String>, payload: EntryPayload) -> Self {
        Self {
            title: title.into(),
            payload,
            tags: Vec::new(),
            pinned: false,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Fields [`update`] may change. Folder membership and the pinned/archived
/// flags have dedicated operations.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub payload: Option<EntryPayload>,
    pub tags: Option<Vec<String>>,
}

pub async fn get<S: StoreClient>(store: &S, id: &str) -> Result<Entry> {
    decode(store.get_one(collections::ENTRIES, id).await?)
}

/// Create an entry in `folder` (`""` for the container root).
///
/// The target folder is checked directly for existence and ownership; the
/// caller is expected to have resolved the path already, so no chain walk
/// happens here. After the entry write, the container counter for the
/// entry's kind is incremented and the tag index picks up the new tag set.
pub async fn create<S: StoreClient>(
    store: &S,
    container: &str,
    folder: &str,
    new: NewEntry,
) -> Result<Entry> {
    store.get_one(collections::CONTAINERS, container).await?;
    if !folder.is_empty() {
        let owner: Folder = decode(store.get_one(collections::FOLDERS, folder).await?)?;
        if owner.container != container {
            return Err(WorkspaceError::OwnershipMismatch {
                kind: "folder",
                id: folder.to_string(),
            });
        }
    }

    debug!(container, folder, title = %new.title, "creating entry");
    let mut entry = Entry::new(container, folder, new.title, new.payload, new.tags);
    entry.pinned = new.pinned;

    let record = store.create(collections::ENTRIES, encode(&entry)?).await?;
    let entry: Entry = decode(record)?;

    containers::bump_counter(store, container, entry.kind(), 1).await?;
    tags::apply_diff(store, container, &[], &entry.tags).await?;

    Ok(entry)
}

/// Payload fields as a store patch, with the counterpart content field
/// nulled so a kind change does not leave a stale value behind.
fn payload_fields(payload: &EntryPayload) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    if let Value::Object(map) = encode(payload)? {
        fields.extend(map);
    }
    match payload {
        EntryPayload::Image { .. } => fields.insert("content".to_string(), Value::Null),
        _ => fields.insert("image".to_string(), Value::Null),
    };
    Ok(fields)
}

pub async fn update<S: StoreClient>(store: &S, id: &str, changes: EntryUpdate) -> Result<Entry> {
    let old = get(store, id).await?;

    let new_tags = changes.tags.unwrap_or_else(|| old.tags.clone());
    let mut fields = Map::new();
    if let Some(title) = changes.title {
        fields.insert("title".to_string(), Value::String(title));
    }
    if let Some(payload) = &changes.payload {
        fields.extend(payload_fields(payload)?);
    }
    fields.insert("tags".to_string(), encode(&new_tags)?);
    fields.insert("updated_at".to_string(), encode(&chrono::Utc::now())?);

    let record = store
        .update(collections::ENTRIES, id, Value::Object(fields))
        .await?;
    let updated: Entry = decode(record)?;

    // The counters only move when the kind changed; the tag diff runs
    // unconditionally and is a no-op for an unchanged set.
    if updated.kind() != old.kind() {
        debug!(id, "entry changed kind, swapping counters");
        containers::bump_counter(store, &old.container, old.kind(), -1).await?;
        containers::bump_counter(store, &old.container, updated.kind(), 1).await?;
    }
    tags::apply_diff(store, &old.container, &old.tags, &updated.tags).await?;

    Ok(updated)
}

/// Delete an entry, releasing its counter and tag references.
/// Returns the entry as it was before deletion.
pub async fn delete<S: StoreClient>(store: &S, id: &str) -> Result<Entry> {
    let entry = get(store, id).await?;

    debug!(id, container = %entry.container, "deleting entry");
    store.delete(collections::ENTRIES, id).await?;
    containers::bump_counter(store, &entry.container, entry.kind(), -1).await?;
    tags::apply_diff(store, &entry.container, &entry.tags, &[]).await?;

    Ok(entry)
}

pub async fn set_pinned<S: StoreClient>(store: &S, id: &str, pinned: bool) -> Result<Entry> {
    let record = store
        .update(
            collections::ENTRIES,
            id,
            serde_json::json!({ "pinned": pinned, "updated_at": chrono::Utc::now() }),
        )
        .await?;
    decode(record)
}

/// Archive or restore an entry. Archiving clears the pin: archived entries
/// never surface in listings, so a stale pin would resurrect unpredictably.
pub async fn set_archived<S: StoreClient>(store: &S, id: &str, archived: bool) -> Result<Entry> {
    let fields = if archived {
        serde_json::json!({ "archived": true, "pinned": false, "updated_at": chrono::Utc::now() })
    } else {
        serde_json::json!({ "archived": false, "updated_at": chrono::Utc::now() })
    };
    let record = store.update(collections::ENTRIES, id, fields).await?;
    decode(record)
}

/// Move an entry into `target_folder`, which must belong to the entry's
/// container. Counters and tags are untouched.
pub async fn move_entry<S: StoreClient>(store: &S, id: &str, target_folder: &str) -> Result<Entry> {
    let entry = get(store, id).await?;

    if !target_folder.is_empty() {
        let target: Folder = decode(store.get_one(collections::FOLDERS, target_folder).await?)?;
        if target.container != entry.container {
            return Err(WorkspaceError::OwnershipMismatch {
                kind: "folder",
                id: target_folder.to_string(),
            });
        }
    }

    let record = store
        .update(
            collections::ENTRIES,
            id,
            serde_json::json!({ "folder": target_folder, "updated_at": chrono::Utc::now() }),
        )
        .await?;
    decode(record)
}

/// Move an entry back to the container root.
pub async fn remove_from_folder<S: StoreClient>(store: &S, id: &str) -> Result<Entry> {
    move_entry(store, id, "").await
}
