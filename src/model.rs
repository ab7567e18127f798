//! # Domain Model
//!
//! Core data types for the hierarchical workspace: [`Container`], [`Folder`],
//! [`Entry`] and [`Tag`].
//!
//! A container is the root aggregate. It owns a folder tree, a tag index and
//! three denormalized per-type counters. Folders form a tree via `parent`
//! links; the empty string is the sentinel for "root of the container", both
//! for `Folder::parent` and `Entry::folder`. Entries reference tags by name,
//! not by id. The tag rows in the store are derived reference counts, kept
//! consistent by the tag index (see [`crate::ops::tags`]).
//!
//! ## Entry payloads
//!
//! An entry is exactly one of three kinds. Text and link entries carry a
//! `content` string, image entries carry an opaque blob reference. The store
//! record is flat (`type` + `content`/`image` fields), so [`EntryPayload`] is
//! a serde-tagged union flattened into [`Entry`]: the variant picks which
//! field exists, and decoding an image record never exposes a phantom
//! `content` field.
//!
//! ## Record tolerance
//!
//! Records written by older clients may carry `tags: null` instead of an
//! empty list; deserialization maps both to an empty `Vec`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Collection names in the backing document store.
pub mod collections {
    pub const CONTAINERS: &str = "containers";
    pub const FOLDERS: &str = "folders";
    pub const ENTRIES: &str = "entries";
    pub const TAGS: &str = "tags";
}

/// Top-level namespace owning a folder tree, a tag index and counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    /// Opaque blob reference for the cover image, if any.
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub text_count: i64,
    #[serde(default)]
    pub link_count: i64,
    #[serde(default)]
    pub image_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Container {
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            cover: None,
            text_count: 0,
            link_count: 0,
            image_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of the counter backing `kind`.
    pub fn count_for(&self, kind: EntryKind) -> i64 {
        match kind {
            EntryKind::Text => self.text_count,
            EntryKind::Link => self.link_count,
            EntryKind::Image => self.image_count,
        }
    }
}

/// A node in a container's folder tree.
///
/// `parent` is the id of the parent folder, or `""` for the container root.
/// The chain of `parent` links must terminate at the root without cycles and
/// must never leave `container`; writes enforce this, reads assume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub container: String,
    #[serde(default)]
    pub parent: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(
        container: impl Into<String>,
        parent: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            container: container.into(),
            parent: parent.into(),
            name: name.into(),
            color: String::new(),
            icon: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Discriminant of an entry's payload, and the key into the container
/// counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Link,
    Image,
}

impl EntryKind {
    /// Name of the container counter field this kind is tallied in.
    pub fn counter_field(&self) -> &'static str {
        match self {
            EntryKind::Text => "text_count",
            EntryKind::Link => "link_count",
            EntryKind::Image => "image_count",
        }
    }
}

/// Kind-specific payload of an entry.
///
/// Flattened into the store record: the `type` field carries the tag, and
/// only the variant's own field (`content` or `image`) is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryPayload {
    Text { content: String },
    Link { content: String },
    Image { image: String },
}

impl EntryPayload {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryPayload::Text { .. } => EntryKind::Text,
            EntryPayload::Link { .. } => EntryKind::Link,
            EntryPayload::Image { .. } => EntryKind::Image,
        }
    }

    /// Searchable text of the payload: the content for text and link
    /// entries, nothing for images (blob references are opaque).
    pub fn search_text(&self) -> Option<&str> {
        match self {
            EntryPayload::Text { content } | EntryPayload::Link { content } => Some(content),
            EntryPayload::Image { .. } => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A leaf entry placed in a folder (or at the container root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub container: String,
    /// Id of the owning folder, `""` for the container root.
    #[serde(default)]
    pub folder: String,
    pub title: String,
    #[serde(flatten)]
    pub payload: EntryPayload,
    /// Tag names, order irrelevant. `null` in the store reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        container: impl Into<String>,
        folder: impl Into<String>,
        title: impl Into<String>,
        payload: EntryPayload,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            container: container.into(),
            folder: folder.into(),
            title: title.into(),
            payload,
            tags,
            pinned: false,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }
}

/// Reference count row for a tag name within one container.
///
/// `count` tracks how many live entries in `container` carry `name` in their
/// tag set. A row with a non-positive count must never persist; the tag index
/// deletes the row when the last reference goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub container: String,
    pub name: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            container: container.into(),
            name: name.into(),
            count: 1,
            created_at: Utc::now(),
        }
    }
}
