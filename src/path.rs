//! # Path Resolver
//!
//! Validates that an ordered sequence of folder ids forms a legal chain
//! rooted at a container, and returns the deepest folder as the "cursor",
//! the effective folder filter every listing, creation and search operation
//! works under. The empty cursor `""` denotes the container root.
//!
//! Resolution is read-only and checks, per segment, that the folder exists,
//! that its `parent` is exactly the previous cursor (no skipping levels),
//! and that it belongs to the claimed container (no cross-container jumps).
//! Any violation fails with [`WorkspaceError::InvalidPath`] naming the
//! offending segment, regardless of where in the path it appears.

use crate::error::{Result, WorkspaceError};
use crate::model::{collections, Folder};
use crate::store::{decode, StoreClient};

/// Walk `segments` from the container root and return the deepest cursor.
///
/// Empty segments are skipped, which tolerates trailing or doubled
/// separators in the path the HTTP layer split. `max_depth` caps the number
/// of real segments accepted; a longer chain cannot be legal in a tree the
/// writers keep acyclic and is rejected rather than walked.
pub async fn resolve<S: StoreClient>(
    store: &S,
    container: &str,
    segments: &[String],
    max_depth: usize,
) -> Result<String> {
    let mut cursor = String::new();
    let mut depth = 0usize;

    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        depth += 1;
        if depth > max_depth {
            return Err(WorkspaceError::InvalidPath(segment.clone()));
        }

        let record = match store.get_one(collections::FOLDERS, segment).await {
            Ok(record) => record,
            Err(err) if err.is_not_found() => {
                return Err(WorkspaceError::InvalidPath(segment.clone()))
            }
            Err(err) => return Err(err),
        };
        let folder: Folder = decode(record)?;

        if folder.container != container || folder.parent != cursor {
            return Err(WorkspaceError::InvalidPath(segment.clone()));
        }
        cursor = segment.clone();
    }

    Ok(cursor)
}
