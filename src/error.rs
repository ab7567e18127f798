use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// A referenced container, folder, entry or tag record does not exist.
    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A folder chain violated the parent/container invariant.
    #[error("Invalid path at segment '{0}'")]
    InvalidPath(String),

    /// A folder or entry belongs to a different container than claimed.
    #[error("{kind} '{id}' belongs to a different container")]
    OwnershipMismatch { kind: &'static str, id: String },

    /// Transport or backend failure in the document store.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store record did not match the expected shape.
    #[error("Malformed record: {0}")]
    Record(#[from] serde_json::Error),

    /// An aggregate repair is already running for this container.
    #[error("Repair already in progress for container '{0}'")]
    RepairInProgress(String),
}

impl WorkspaceError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// True for the miss variant, used where absence is an expected answer
    /// (e.g. the tag-removal branch of the tag index).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = WorkspaceError::not_found("folders", "f1");
        assert_eq!(err.to_string(), "Not found: folders/f1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_is_not_found_negative() {
        let err = WorkspaceError::InvalidPath("f2".into());
        assert!(!err.is_not_found());
    }
}
