//! In-memory document store.
//!
//! Reference implementation of [`StoreClient`] used by the test suite and by
//! embedders that want the workspace logic without a hosted backend. State is
//! a map of collection → id → JSON record behind a [`parking_lot::RwLock`];
//! none of the trait methods await while holding the lock, so the store is
//! safe to share across tasks.
//!
//! Write failures can be simulated with [`InMemoryStore::set_fail_writes`],
//! mirroring how transport errors from a real store surface as
//! [`WorkspaceError::StoreUnavailable`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, Sort, StoreClient};
use crate::error::{Result, WorkspaceError};

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write (create/update/delete/increment) fail with
    /// `StoreUnavailable` until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Number of records currently in a collection.
    pub fn record_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(WorkspaceError::StoreUnavailable(
                "simulated write failure".to_string(),
            ));
        }
        Ok(())
    }
}

/// Record field ordering for sort evaluation.
///
/// Timestamps are stored as RFC 3339 strings with variable subsecond
/// precision, so plain string comparison can misorder them; parse both sides
/// as timestamps first and fall back to lexicographic order.
fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}

fn sorted(mut records: Vec<Value>, sort: &[Sort]) -> Vec<Value> {
    records.sort_by(|a, b| {
        for key in sort {
            let left = a.get(key.field()).unwrap_or(&Value::Null);
            let right = b.get(key.field()).unwrap_or(&Value::Null);
            let ord = value_cmp(left, right);
            let ord = if key.descending() { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    records
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get_one(&self, collection: &str, id: &str) -> Result<Value> {
        self.collections
            .read()
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| WorkspaceError::not_found(collection, id))
    }

    async fn create(&self, collection: &str, fields: Value) -> Result<Value> {
        self.check_writable()?;
        if !fields.is_object() {
            return Err(WorkspaceError::Record(serde::de::Error::custom(
                "record fields must be a JSON object",
            )));
        }
        let mut record = fields;
        let id = match record.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().simple().to_string(),
        };
        record["id"] = Value::String(id.clone());

        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Value> {
        self.check_writable()?;
        let mut collections = self.collections.write();
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| WorkspaceError::not_found(collection, id))?;

        if let (Some(target), Some(patch)) = (record.as_object_mut(), fields.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
            // The id is not patchable.
            target.insert("id".to_string(), Value::String(id.to_string()));
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.collections.write();
        let removed = collections
            .get_mut(collection)
            .and_then(|records| records.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(WorkspaceError::not_found(collection, id)),
        }
    }

    async fn list(&self, collection: &str, filter: &Filter, sort: &[Sort]) -> Result<Vec<Value>> {
        let records: Vec<Value> = self
            .collections
            .read()
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(sorted(records, sort))
    }

    async fn first_match(&self, collection: &str, filter: &Filter) -> Result<Value> {
        self.collections
            .read()
            .get(collection)
            .and_then(|records| records.values().find(|record| filter.matches(record)))
            .cloned()
            .ok_or_else(|| WorkspaceError::not_found(collection, "<first-match>"))
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.collections.write();
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| WorkspaceError::not_found(collection, id))?;

        let current = record.get(field).and_then(Value::as_i64).unwrap_or(0);
        record[field] = Value::from(current + delta);
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    //! Seed helpers writing production-shaped records straight to the store,
    //! bypassing the managers. Useful for arranging preconditions (including
    //! deliberately inconsistent ones) without running the mutation fan-out.

    use super::*;
    use crate::model::{collections, Container, Entry, EntryPayload, Folder, Tag};
    use crate::store::{decode, encode};

    pub async fn seed_container(store: &InMemoryStore, name: &str) -> Container {
        let container = Container::new(name, "#888888", "box");
        let record = store
            .create(collections::CONTAINERS, encode(&container).unwrap())
            .await
            .unwrap();
        decode(record).unwrap()
    }

    pub async fn seed_folder(
        store: &InMemoryStore,
        container: &str,
        parent: &str,
        name: &str,
    ) -> Folder {
        let folder = Folder::new(container, parent, name);
        let record = store
            .create(collections::FOLDERS, encode(&folder).unwrap())
            .await
            .unwrap();
        decode(record).unwrap()
    }

    pub async fn seed_entry(
        store: &InMemoryStore,
        container: &str,
        folder: &str,
        title: &str,
        payload: EntryPayload,
        tags: &[&str],
    ) -> Entry {
        let entry = Entry::new(
            container,
            folder,
            title,
            payload,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        let record = store
            .create(collections::ENTRIES, encode(&entry).unwrap())
            .await
            .unwrap();
        decode(record).unwrap()
    }

    pub async fn seed_tag(store: &InMemoryStore, container: &str, name: &str, count: i64) -> Tag {
        let mut tag = Tag::new(container, name);
        tag.count = count;
        let record = store
            .create(collections::TAGS, encode(&tag).unwrap())
            .await
            .unwrap();
        decode(record).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_id() {
        let store = InMemoryStore::new();
        let record = store
            .create("containers", json!({"name": "Notes"}))
            .await
            .unwrap();
        let id = record["id"].as_str().unwrap();
        assert!(!id.is_empty());

        let fetched = store.get_one("containers", id).await.unwrap();
        assert_eq!(fetched["name"], "Notes");
    }

    #[tokio::test]
    async fn test_create_keeps_provided_id() {
        let store = InMemoryStore::new();
        let record = store
            .create("containers", json!({"id": "c1", "name": "Notes"}))
            .await
            .unwrap();
        assert_eq!(record["id"], "c1");
    }

    #[tokio::test]
    async fn test_get_one_not_found() {
        let store = InMemoryStore::new();
        let err = store.get_one("containers", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_merges_partially() {
        let store = InMemoryStore::new();
        let record = store
            .create("folders", json!({"name": "Work", "color": "red"}))
            .await
            .unwrap();
        let id = record["id"].as_str().unwrap();

        let updated = store
            .update("folders", id, json!({"color": "blue"}))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Work");
        assert_eq!(updated["color"], "blue");
        assert_eq!(updated["id"], id);
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let store = InMemoryStore::new();
        let record = store.create("folders", json!({"name": "A"})).await.unwrap();
        let id = record["id"].as_str().unwrap();

        let updated = store
            .update("folders", id, json!({"id": "hijacked"}))
            .await
            .unwrap();
        assert_eq!(updated["id"], id);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let store = InMemoryStore::new();
        let record = store.create("entries", json!({"title": "x"})).await.unwrap();
        let id = record["id"].as_str().unwrap();

        store.delete("entries", id).await.unwrap();
        assert!(store.get_one("entries", id).await.unwrap_err().is_not_found());
        assert!(store.delete("entries", id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = InMemoryStore::new();
        for (name, container) in [("b", "c1"), ("a", "c1"), ("z", "c2")] {
            store
                .create("folders", json!({"name": name, "container": container}))
                .await
                .unwrap();
        }

        let filter = Filter::new().eq("container", "c1");
        let listed = store
            .list("folders", &filter, &[Sort::Asc("name")])
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_sort_timestamps_with_mixed_precision() {
        let store = InMemoryStore::new();
        // Lexicographically "...00Z" > "...00.5Z", but as instants it is earlier.
        store
            .create("entries", json!({"title": "early", "created_at": "2024-01-01T10:00:00Z"}))
            .await
            .unwrap();
        store
            .create("entries", json!({"title": "late", "created_at": "2024-01-01T10:00:00.500Z"}))
            .await
            .unwrap();

        let listed = store
            .list("entries", &Filter::new(), &[Sort::Desc("created_at")])
            .await
            .unwrap();
        assert_eq!(listed[0]["title"], "late");
        assert_eq!(listed[1]["title"], "early");
    }

    #[tokio::test]
    async fn test_sort_bool_desc_puts_true_first() {
        let store = InMemoryStore::new();
        store
            .create("entries", json!({"title": "plain", "pinned": false}))
            .await
            .unwrap();
        store
            .create("entries", json!({"title": "pinned", "pinned": true}))
            .await
            .unwrap();

        let listed = store
            .list("entries", &Filter::new(), &[Sort::Desc("pinned")])
            .await
            .unwrap();
        assert_eq!(listed[0]["title"], "pinned");
    }

    #[tokio::test]
    async fn test_first_match() {
        let store = InMemoryStore::new();
        store
            .create("tags", json!({"container": "c1", "name": "idea"}))
            .await
            .unwrap();

        let found = store
            .first_match("tags", &Filter::new().eq("container", "c1").eq("name", "idea"))
            .await
            .unwrap();
        assert_eq!(found["name"], "idea");

        let missing = store
            .first_match("tags", &Filter::new().eq("name", "absent"))
            .await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_increment_adds_delta() {
        let store = InMemoryStore::new();
        let record = store
            .create("containers", json!({"name": "Notes", "text_count": 1}))
            .await
            .unwrap();
        let id = record["id"].as_str().unwrap();

        store.increment("containers", id, "text_count", 2).await.unwrap();
        store.increment("containers", id, "link_count", 1).await.unwrap();

        let fetched = store.get_one("containers", id).await.unwrap();
        assert_eq!(fetched["text_count"], 3);
        // Missing fields start from zero.
        assert_eq!(fetched["link_count"], 1);
    }

    #[tokio::test]
    async fn test_fail_writes_blocks_mutations_only() {
        let store = InMemoryStore::new();
        let record = store.create("entries", json!({"title": "x"})).await.unwrap();
        let id = record["id"].as_str().unwrap().to_string();

        store.set_fail_writes(true);
        assert!(store.create("entries", json!({})).await.is_err());
        assert!(store.update("entries", &id, json!({})).await.is_err());
        assert!(store.delete("entries", &id).await.is_err());
        assert!(store.increment("entries", &id, "n", 1).await.is_err());
        // Reads keep working.
        assert!(store.get_one("entries", &id).await.is_ok());

        store.set_fail_writes(false);
        assert!(store.update("entries", &id, json!({})).await.is_ok());
    }
}
