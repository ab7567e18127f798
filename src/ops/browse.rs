//! Immediate children of a cursor.

use crate::error::Result;
use crate::model::{collections, Entry, Folder};
use crate::store::{decode, Filter, Sort, StoreClient};

/// One level of the tree as the UI shows it.
#[derive(Debug, Clone, Default)]
pub struct FolderListing {
    /// Child folders, by name.
    pub folders: Vec<Folder>,
    /// Non-archived entries, pinned first, then newest first.
    pub entries: Vec<Entry>,
}

/// List the folders and entries directly under `cursor` (`""` for the
/// container root). Archived entries are hidden here; they remain reachable
/// by id and are still counted by the tag index.
pub async fn list_children<S: StoreClient>(
    store: &S,
    container: &str,
    cursor: &str,
) -> Result<FolderListing> {
    let folder_filter = Filter::new().eq("container", container).eq("parent", cursor);
    let folder_records = store
        .list(collections::FOLDERS, &folder_filter, &[Sort::Asc("name")])
        .await?;

    let entry_filter = Filter::new()
        .eq("container", container)
        .eq("folder", cursor)
        .eq("archived", false);
    let entry_records = store
        .list(
            collections::ENTRIES,
            &entry_filter,
            &[Sort::Desc("pinned"), Sort::Desc("created_at")],
        )
        .await?;

    Ok(FolderListing {
        folders: folder_records.into_iter().map(decode).collect::<Result<_>>()?,
        entries: entry_records.into_iter().map(decode).collect::<Result<_>>()?,
    })
}
