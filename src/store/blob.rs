//! Blob storage interface.
//!
//! Cover images and entry attachments live in an external file store. The
//! core only ever handles the opaque reference string it gets back from
//! [`BlobStore::put`]; it is stored on `Container::cover` / the image entry
//! payload and passed through unchanged.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Accepts a named byte buffer and returns an opaque reference.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, data: Vec<u8>) -> Result<String>;
}

/// In-memory blob store for tests and embedders.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.blobs.read().get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, data: Vec<u8>) -> Result<String> {
        let reference = format!("{}-{}", Uuid::new_v4().simple(), name);
        self.blobs.write().insert(reference.clone(), data);
        Ok(reference)
    }
}
