use async_trait::async_trait;

use crate::{Change, CommitReceipt, Document, EntityId, Result, StorageError};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Reads observe only
/// committed state; writes happen exclusively through [`DocumentStore::commit`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by identity.
    async fn get(&self, collection: &str, id: EntityId) -> Result<Option<Document>>;

    /// Retrieves a document by its natural key.
    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Retrieves every document of a collection, ordered by identity ascending.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Applies a batch of changes atomically - either all succeed or none do.
    ///
    /// Updates and deletes fail with `ConcurrencyConflict` when the stored
    /// version differs from the version the change was staged against.
    async fn commit(&self, changes: Vec<Change>) -> Result<CommitReceipt>;
}

/// Validates a batch of changes before it reaches the store.
pub fn validate_changes(changes: &[Change]) -> Result<()> {
    for change in changes {
        if change.collection().trim().is_empty() {
            return Err(StorageError::InvalidChange(format!(
                "{} without a collection",
                change.kind()
            )));
        }

        if let Change::Insert { key: Some(key), .. } = change
            && key.trim().is_empty()
        {
            return Err(StorageError::InvalidChange(
                "insert with a blank natural key".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    #[test]
    fn rejects_blank_collection() {
        let changes = vec![Change::Delete {
            collection: " ".to_string(),
            id: EntityId::new(1),
            expected: Version::first(),
        }];
        assert!(matches!(
            validate_changes(&changes),
            Err(StorageError::InvalidChange(_))
        ));
    }

    #[test]
    fn rejects_blank_natural_key() {
        let changes = vec![Change::Insert {
            collection: "courses".to_string(),
            key: Some(String::new()),
            body: serde_json::json!({}),
        }];
        assert!(validate_changes(&changes).is_err());
    }

    #[test]
    fn accepts_well_formed_batch() {
        let changes = vec![
            Change::Insert {
                collection: "students".to_string(),
                key: None,
                body: serde_json::json!({"name": "Ann"}),
            },
            Change::Update {
                collection: "students".to_string(),
                id: EntityId::new(2),
                expected: Version::first(),
                body: serde_json::json!({"name": "Bob"}),
            },
        ];
        assert!(validate_changes(&changes).is_ok());
    }
}
