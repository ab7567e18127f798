//! Folder lifecycle and re-parenting.
//!
//! Creation and moves are the write-time guard for the tree invariant the
//! resolver and the subtree search rely on: a folder's parent chain must
//! terminate at the container root without cycles and without crossing into
//! another container. Deletion does **not** cascade: children and entries
//! of a deleted folder keep referencing its id (source-preserved behavior;
//! the product semantics for cascading were never specified).

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, WorkspaceError};
use crate::model::{collections, Folder};
use crate::store::{decode, encode, StoreClient};

pub async fn get<S: StoreClient>(store: &S, id: &str) -> Result<Folder> {
    decode(store.get_one(collections::FOLDERS, id).await?)
}

/// Create a folder under `parent` (`""` for the container root).
///
/// The owning container must exist; a non-root parent must exist and belong
/// to the same container.
pub async fn create<S: StoreClient>(
    store: &S,
    container: &str,
    parent: &str,
    name: &str,
) -> Result<Folder> {
    store.get_one(collections::CONTAINERS, container).await?;
    if !parent.is_empty() {
        let parent_folder = get(store, parent).await?;
        if parent_folder.container != container {
            return Err(WorkspaceError::OwnershipMismatch {
                kind: "folder",
                id: parent.to_string(),
            });
        }
    }

    debug!(container, parent, name, "creating folder");
    let folder = Folder::new(container, parent, name);
    let record = store.create(collections::FOLDERS, encode(&folder)?).await?;
    decode(record)
}

/// Partial update of the presentation fields. Re-parenting goes through
/// [`move_folder`].
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub async fn update<S: StoreClient>(store: &S, id: &str, changes: FolderUpdate) -> Result<Folder> {
    let mut fields = Map::new();
    if let Some(name) = changes.name {
        fields.insert("name".to_string(), Value::String(name));
    }
    if let Some(color) = changes.color {
        fields.insert("color".to_string(), Value::String(color));
    }
    if let Some(icon) = changes.icon {
        fields.insert("icon".to_string(), Value::String(icon));
    }
    fields.insert("updated_at".to_string(), encode(&chrono::Utc::now())?);

    let record = store
        .update(collections::FOLDERS, id, Value::Object(fields))
        .await?;
    decode(record)
}

/// Re-parent a folder within its container.
///
/// Rejected when the target is the folder itself, one of its descendants
/// (which would detach the subtree into a cycle), or a folder of another
/// container. `max_depth` bounds the ancestor walk so a chain corrupted by
/// out-of-band writes cannot loop forever.
pub async fn move_folder<S: StoreClient>(
    store: &S,
    id: &str,
    new_parent: &str,
    max_depth: usize,
) -> Result<Folder> {
    let folder = get(store, id).await?;

    if !new_parent.is_empty() {
        if new_parent == id {
            return Err(WorkspaceError::InvalidPath(new_parent.to_string()));
        }
        let target = get(store, new_parent).await?;
        if target.container != folder.container {
            return Err(WorkspaceError::OwnershipMismatch {
                kind: "folder",
                id: new_parent.to_string(),
            });
        }
        if is_descendant(store, new_parent, id, max_depth).await? {
            return Err(WorkspaceError::InvalidPath(new_parent.to_string()));
        }
    }

    debug!(id, new_parent, "moving folder");
    let record = store
        .update(
            collections::FOLDERS,
            id,
            serde_json::json!({ "parent": new_parent, "updated_at": chrono::Utc::now() }),
        )
        .await?;
    decode(record)
}

/// Delete a folder. Children and entries are left in place, dangling.
pub async fn delete<S: StoreClient>(store: &S, id: &str) -> Result<()> {
    debug!(id, "deleting folder (children are not cascaded)");
    store.delete(collections::FOLDERS, id).await
}

/// Walk the parent chain from `start` looking for `ancestor`.
async fn is_descendant<S: StoreClient>(
    store: &S,
    start: &str,
    ancestor: &str,
    max_depth: usize,
) -> Result<bool> {
    let mut cursor = start.to_string();
    for _ in 0..max_depth {
        let folder = get(store, &cursor).await?;
        if folder.parent.is_empty() {
            return Ok(false);
        }
        if folder.parent == ancestor {
            return Ok(true);
        }
        cursor = folder.parent;
    }
    // Depth exhausted: the chain is deeper than any tree writes allow, so
    // refuse the move rather than trust it.
    Ok(true)
}
