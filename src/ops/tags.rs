//! # Tag Index
//!
//! Per-container reference counts over tag names. Entries reference tags by
//! name only, so the tag rows are derived data: a row is created on first
//! use, its `count` follows the number of live entries carrying the name,
//! and it is deleted when the count would reach zero.
//!
//! [`apply_diff`] is the single entry point. Entry mutations hand it the old
//! and new tag sets and it computes the set differences itself, so callers
//! never manipulate counts directly.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{collections, Tag};
use crate::store::{decode, encode, Filter, Sort, StoreClient};

/// Reconcile the tag index with an entry's tag-set change.
///
/// `removed = old − new` is processed before `added = new − old`, so a name
/// present in both sets is never touched. Names are matched case-sensitively
/// and exactly.
///
/// Each per-name operation is independent and best-effort: a failure on one
/// name does not stop the others, and the first failure is returned once
/// every name has been attempted. A removal whose tag row is already gone is
/// a no-op: the index was already consistent with the requested end state.
///
/// The decrement path reads the row first because delete-on-zero needs the
/// current count; two concurrent removals of the same last reference can
/// therefore race. The loser's delete sees `NotFound` and is swallowed.
pub async fn apply_diff<S: StoreClient>(
    store: &S,
    container: &str,
    old_tags: &[String],
    new_tags: &[String],
) -> Result<()> {
    let old: BTreeSet<&str> = old_tags.iter().map(String::as_str).collect();
    let new: BTreeSet<&str> = new_tags.iter().map(String::as_str).collect();

    let mut first_error = None;

    for name in old.difference(&new) {
        if let Err(err) = release(store, container, name).await {
            warn!(container, tag = *name, %err, "tag release failed");
            first_error.get_or_insert(err);
        }
    }
    for name in new.difference(&old) {
        if let Err(err) = acquire(store, container, name).await {
            warn!(container, tag = *name, %err, "tag acquire failed");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Drop one reference: decrement, or delete the row at count 1.
async fn release<S: StoreClient>(store: &S, container: &str, name: &str) -> Result<()> {
    let record = match find(store, container, name).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            // Already absent. The index was inconsistent before this call;
            // the requested end state holds, so treat as done.
            warn!(container, tag = name, "released tag had no row");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let tag: Tag = decode(record)?;

    if tag.count <= 1 {
        debug!(container, tag = name, "deleting tag at zero references");
        match store.delete(collections::TAGS, &tag.id).await {
            Err(err) if err.is_not_found() => Ok(()),
            result => result,
        }
    } else {
        store
            .increment(collections::TAGS, &tag.id, "count", -1)
            .await
    }
}

/// Add one reference: increment, or create the row on first use.
async fn acquire<S: StoreClient>(store: &S, container: &str, name: &str) -> Result<()> {
    match find(store, container, name).await? {
        Some(record) => {
            let tag: Tag = decode(record)?;
            store
                .increment(collections::TAGS, &tag.id, "count", 1)
                .await
        }
        None => {
            debug!(container, tag = name, "creating tag on first use");
            store
                .create(collections::TAGS, encode(&Tag::new(container, name))?)
                .await
                .map(|_| ())
        }
    }
}

async fn find<S: StoreClient>(
    store: &S,
    container: &str,
    name: &str,
) -> Result<Option<serde_json::Value>> {
    let filter = Filter::new().eq("container", container).eq("name", name);
    match store.first_match(collections::TAGS, &filter).await {
        Ok(record) => Ok(Some(record)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// All tag rows of a container, by name.
pub async fn list<S: StoreClient>(store: &S, container: &str) -> Result<Vec<Tag>> {
    let filter = Filter::new().eq("container", container);
    let records = store
        .list(collections::TAGS, &filter, &[Sort::Asc("name")])
        .await?;
    records.into_iter().map(decode).collect()
}

/// Look up one tag row by name, if present.
pub async fn get<S: StoreClient>(store: &S, container: &str, name: &str) -> Result<Option<Tag>> {
    match find(store, container, name).await? {
        Some(record) => Ok(Some(decode(record)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkspaceError;
    use crate::store::memory::fixtures::{seed_container, seed_tag};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::Value;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_use_creates_with_count_one() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;

        apply_diff(&store, &container.id, &[], &tags(&["idea"])).await.unwrap();

        let tag = get(&store, &container.id, "idea").await.unwrap().unwrap();
        assert_eq!(tag.count, 1);
    }

    #[tokio::test]
    async fn test_second_use_increments() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;

        apply_diff(&store, &container.id, &[], &tags(&["idea"])).await.unwrap();
        apply_diff(&store, &container.id, &[], &tags(&["idea"])).await.unwrap();

        let tag = get(&store, &container.id, "idea").await.unwrap().unwrap();
        assert_eq!(tag.count, 2);
        assert_eq!(store.record_count(collections::TAGS), 1);
    }

    #[tokio::test]
    async fn test_release_decrements_then_deletes_at_zero() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;
        seed_tag(&store, &container.id, "idea", 2).await;

        apply_diff(&store, &container.id, &tags(&["idea"]), &[]).await.unwrap();
        let tag = get(&store, &container.id, "idea").await.unwrap().unwrap();
        assert_eq!(tag.count, 1);

        apply_diff(&store, &container.id, &tags(&["idea"]), &[]).await.unwrap();
        assert!(get(&store, &container.id, "idea").await.unwrap().is_none());
        assert_eq!(store.record_count(collections::TAGS), 0);
    }

    #[tokio::test]
    async fn test_release_of_missing_tag_is_noop() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;

        // Index already inconsistent; must not error.
        apply_diff(&store, &container.id, &tags(&["ghost"]), &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_unchanged_set_touches_nothing() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;
        seed_tag(&store, &container.id, "idea", 3).await;

        apply_diff(
            &store,
            &container.id,
            &tags(&["idea", "urgent"]),
            &tags(&["urgent", "idea"]),
        )
        .await
        .unwrap();

        let tag = get(&store, &container.id, "idea").await.unwrap().unwrap();
        assert_eq!(tag.count, 3);
        // "urgent" was in both sets, so no row was created for it either.
        assert!(get(&store, &container.id, "urgent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mixed_diff() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;
        seed_tag(&store, &container.id, "old", 1).await;
        seed_tag(&store, &container.id, "kept", 1).await;

        apply_diff(
            &store,
            &container.id,
            &tags(&["old", "kept"]),
            &tags(&["kept", "fresh"]),
        )
        .await
        .unwrap();

        assert!(get(&store, &container.id, "old").await.unwrap().is_none());
        assert_eq!(get(&store, &container.id, "kept").await.unwrap().unwrap().count, 1);
        assert_eq!(get(&store, &container.id, "fresh").await.unwrap().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_case_sensitive_names() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;

        apply_diff(&store, &container.id, &[], &tags(&["Idea"])).await.unwrap();
        apply_diff(&store, &container.id, &[], &tags(&["idea"])).await.unwrap();

        assert_eq!(store.record_count(collections::TAGS), 2);
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let store = InMemoryStore::new();
        let container = seed_container(&store, "Notes").await;
        seed_tag(&store, &container.id, "zebra", 1).await;
        seed_tag(&store, &container.id, "alpha", 1).await;

        let listed = list(&store, &container.id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zebra"]);
    }

    /// Store wrapper that refuses to create a tag row for one specific name.
    struct VetoStore {
        inner: InMemoryStore,
        vetoed: String,
    }

    #[async_trait]
    impl StoreClient for VetoStore {
        async fn get_one(&self, collection: &str, id: &str) -> Result<Value> {
            self.inner.get_one(collection, id).await
        }
        async fn create(&self, collection: &str, fields: Value) -> Result<Value> {
            if collection == collections::TAGS && fields["name"] == self.vetoed.as_str() {
                return Err(WorkspaceError::StoreUnavailable("vetoed".into()));
            }
            self.inner.create(collection, fields).await
        }
        async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Value> {
            self.inner.update(collection, id, fields).await
        }
        async fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.inner.delete(collection, id).await
        }
        async fn list(&self, collection: &str, filter: &Filter, sort: &[Sort]) -> Result<Vec<Value>> {
            self.inner.list(collection, filter, sort).await
        }
        async fn first_match(&self, collection: &str, filter: &Filter) -> Result<Value> {
            self.inner.first_match(collection, filter).await
        }
        async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()> {
            self.inner.increment(collection, id, field, delta).await
        }
    }

    #[tokio::test]
    async fn test_best_effort_continues_past_failures() {
        let store = VetoStore {
            inner: InMemoryStore::new(),
            vetoed: "bad".to_string(),
        };
        let container = seed_container(&store.inner, "Notes").await;

        // "bad" sorts before "good", so the failure happens first and the
        // remaining name must still be attempted.
        let result = apply_diff(&store, &container.id, &[], &tags(&["bad", "good"])).await;

        assert!(matches!(result, Err(WorkspaceError::StoreUnavailable(_))));
        assert!(get(&store, &container.id, "good").await.unwrap().is_some());
        assert!(get(&store, &container.id, "bad").await.unwrap().is_none());
    }
}
