//! # Store Layer
//!
//! This module defines the contract between the workspace core and its
//! external collaborators: the document store ([`StoreClient`]) and the blob
//! store ([`BlobStore`]).
//!
//! ## Document store
//!
//! The backing store is a hosted document database addressed by collection
//! name and record id, queried with flat AND-of-equality filters. It offers
//! **no multi-document transactions and no joins**. Every multi-step
//! mutation in [`crate::ops`] is a sequence of independent round-trips, and
//! the crate is written so each step is individually idempotent or
//! recoverable (see [`crate::ops::repair`]).
//!
//! Records travel as [`serde_json::Value`]; the domain types in
//! [`crate::model`] define the shapes, and [`decode`]/[`encode`] convert at
//! the boundary.
//!
//! ## Counters
//!
//! [`StoreClient::increment`] is the atomic numeric-delta primitive. All
//! container and tag counter updates go through it rather than
//! read-modify-write, which removes the lost-update race between concurrent
//! mutations of the same counter field.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`]: reference implementation for tests and
//!   embedders.
//! - Production clients live with the host process; anything that speaks the
//!   store's wire protocol and honors the semantics documented on the trait
//!   methods can back a [`crate::api::Workspace`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub mod blob;
pub mod memory;

pub use blob::{BlobStore, MemoryBlobStore};
pub use memory::InMemoryStore;

/// AND-of-equality predicate over record fields.
///
/// The store evaluates each clause as exact equality on the named field; a
/// record matches when every clause holds. Missing fields compare as JSON
/// `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    /// Evaluate the predicate against a record. Backends without their own
    /// query engine (the in-memory store) use this directly.
    pub fn matches(&self, record: &Value) -> bool {
        self.clauses.iter().all(|(field, expected)| {
            record.get(field).unwrap_or(&Value::Null) == expected
        })
    }
}

/// One sort key; earlier keys take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Asc(&'static str),
    Desc(&'static str),
}

impl Sort {
    pub fn field(&self) -> &'static str {
        match self {
            Sort::Asc(f) | Sort::Desc(f) => f,
        }
    }

    pub fn descending(&self) -> bool {
        matches!(self, Sort::Desc(_))
    }
}

/// Generic document-store access.
///
/// Implementations map their transport errors to
/// [`crate::error::WorkspaceError::StoreUnavailable`] and report missing
/// records as [`crate::error::WorkspaceError::NotFound`].
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch a record by id. `NotFound` if absent.
    async fn get_one(&self, collection: &str, id: &str) -> Result<Value>;

    /// Create a record. The store assigns the id when the fields carry none;
    /// the returned record includes it.
    async fn create(&self, collection: &str, fields: Value) -> Result<Value>;

    /// Partially update a record: provided fields overwrite, absent fields
    /// keep their stored value. Returns the updated record.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Value>;

    /// Delete a record by id. `NotFound` if absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// List all records matching `filter`, ordered by `sort`.
    async fn list(&self, collection: &str, filter: &Filter, sort: &[Sort]) -> Result<Vec<Value>>;

    /// First record matching `filter`, or `NotFound`.
    async fn first_match(&self, collection: &str, filter: &Filter) -> Result<Value>;

    /// Atomically add `delta` to a numeric field of one record.
    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()>;
}

/// Decode a store record into a domain type.
pub fn decode<T: DeserializeOwned>(record: Value) -> Result<T> {
    Ok(serde_json::from_value(record)?)
}

/// Encode a domain value into store record fields.
pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
