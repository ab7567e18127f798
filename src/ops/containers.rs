//! Container lifecycle.
//!
//! Containers are the root aggregate: plain CRUD plus the three per-type
//! entry counters and the cover image. The counters are only ever mutated
//! through [`bump_counter`], which uses the store's atomic increment rather
//! than read-modify-write, and only by the entry manager and the repair job.
//!
//! Deleting a container does **not** cascade into its folders, entries or
//! tags; disposing of the contents first is the caller's responsibility.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::model::{collections, Container, EntryKind};
use crate::store::{decode, encode, BlobStore, Filter, Sort, StoreClient};

pub async fn create<S: StoreClient>(
    store: &S,
    name: &str,
    color: &str,
    icon: &str,
) -> Result<Container> {
    debug!(name, "creating container");
    let container = Container::new(name, color, icon);
    let record = store
        .create(collections::CONTAINERS, encode(&container)?)
        .await?;
    decode(record)
}

pub async fn get<S: StoreClient>(store: &S, id: &str) -> Result<Container> {
    decode(store.get_one(collections::CONTAINERS, id).await?)
}

/// All containers, by name.
pub async fn list<S: StoreClient>(store: &S) -> Result<Vec<Container>> {
    let records = store
        .list(collections::CONTAINERS, &Filter::new(), &[Sort::Asc("name")])
        .await?;
    records.into_iter().map(decode).collect()
}

/// Partial update of the mutable presentation fields.
#[derive(Debug, Clone, Default)]
pub struct ContainerUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub async fn update<S: StoreClient>(
    store: &S,
    id: &str,
    changes: ContainerUpdate,
) -> Result<Container> {
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
        .update(collections::CONTAINERS, id, Value::Object(fields))
        .await?;
    decode(record)
}

pub async fn delete<S: StoreClient>(store: &S, id: &str) -> Result<()> {
    debug!(id, "deleting container (contents are not cascaded)");
    store.delete(collections::CONTAINERS, id).await
}

/// Upload a cover image and store its opaque reference on the container.
pub async fn upload_cover<S: StoreClient, B: BlobStore>(
    store: &S,
    blobs: &B,
    id: &str,
    filename: &str,
    data: Vec<u8>,
) -> Result<Container> {
    // Fail before the upload when the container is gone.
    get(store, id).await?;

    let reference = blobs.put(filename, data).await?;
    let record = store
        .update(
            collections::CONTAINERS,
            id,
            serde_json::json!({ "cover": reference, "updated_at": chrono::Utc::now() }),
        )
        .await?;
    decode(record)
}

/// Apply an atomic delta to the counter backing `kind`.
pub(crate) async fn bump_counter<S: StoreClient>(
    store: &S,
    id: &str,
    kind: EntryKind,
    delta: i64,
) -> Result<()> {
    store
        .increment(collections::CONTAINERS, id, kind.counter_field(), delta)
        .await
}
