//! # Subtree Search
//!
//! Depth-exhaustive search across a folder subtree: every non-archived entry
//! under the root cursor whose text matches the query and whose tag set
//! contains every requested tag.
//!
//! The traversal is an explicit worklist over tree levels rather than
//! recursion. The tree can be deep and each visited folder costs a pair of
//! store round-trips, so the call stack must not grow with depth. Within a
//! level, sibling folders are fetched concurrently, bounded by the
//! configured fan-out; the store calls dominate latency and this keeps a
//! wide level from serializing. Result order is unspecified.
//!
//! Termination: folder trees are finite and acyclic (the write paths in
//! [`crate::ops::folders`] reject cycles), so the worklist drains.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::Result;
use crate::model::{collections, Entry, Folder};
use crate::store::{decode, Filter, StoreClient};

/// A matching entry plus the folder ids walked from the search root to the
/// entry's own folder. Empty when the entry sits directly in the root
/// cursor; the root itself is not included.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub entry: Entry,
    pub path: Vec<String>,
}

/// Search criteria. An empty query matches every entry; tags must all be
/// present on the entry (AND semantics, exact names).
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub tags: Vec<String>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    fn matches(&self, entry: &Entry, needle: &str) -> bool {
        if !self.tags.iter().all(|tag| entry.tags.contains(tag)) {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        if entry.title.to_lowercase().contains(needle) {
            return true;
        }
        entry
            .payload
            .search_text()
            .map(|content| content.to_lowercase().contains(needle))
            .unwrap_or(false)
    }
}

/// Collect all matches in the subtree rooted at `root` (`""` for the whole
/// container). `fanout` bounds concurrent sibling-folder visits per level.
pub async fn search_subtree<S: StoreClient>(
    store: &S,
    container: &str,
    root: &str,
    query: &SearchQuery,
    fanout: usize,
) -> Result<Vec<SearchHit>> {
    let needle = query.text.trim().to_lowercase();
    let fanout = fanout.max(1);

    let mut hits = Vec::new();
    let mut level: Vec<(String, Vec<String>)> = vec![(root.to_string(), Vec::new())];
    let mut visited = 0usize;

    while !level.is_empty() {
        let current: Vec<(String, Vec<String>)> = std::mem::take(&mut level);
        visited += current.len();

        let results: Vec<Result<(Vec<SearchHit>, Vec<(String, Vec<String>)>)>> =
            stream::iter(current)
                .map(|(cursor, path)| visit(store, container, cursor, path, query, &needle))
                .buffer_unordered(fanout)
                .collect()
                .await;

        for result in results {
            let (found, children) = result?;
            hits.extend(found);
            level.extend(children);
        }
    }

    debug!(container, root, visited, hits = hits.len(), "subtree search done");
    Ok(hits)
}

/// One folder visit: matching entries here, plus the child folders to walk
/// next with their accumulated paths.
async fn visit<S: StoreClient>(
    store: &S,
    container: &str,
    cursor: String,
    path: Vec<String>,
    query: &SearchQuery,
    needle: &str,
) -> Result<(Vec<SearchHit>, Vec<(String, Vec<String>)>)> {
    let entry_filter = Filter::new()
        .eq("container", container)
        .eq("folder", cursor.clone())
        .eq("archived", false);
    let entry_records = store.list(collections::ENTRIES, &entry_filter, &[]).await?;

    let mut hits = Vec::new();
    for record in entry_records {
        let entry: Entry = decode(record)?;
        if query.matches(&entry, needle) {
            hits.push(SearchHit {
                entry,
                path: path.clone(),
            });
        }
    }

    let folder_filter = Filter::new().eq("container", container).eq("parent", cursor);
    let folder_records = store.list(collections::FOLDERS, &folder_filter, &[]).await?;

    let mut children = Vec::with_capacity(folder_records.len());
    for record in folder_records {
        let folder: Folder = decode(record)?;
        let mut child_path = path.clone();
        child_path.push(folder.id.clone());
        children.push((folder.id, child_path));
    }

    Ok((hits, children))
}
