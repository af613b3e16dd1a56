use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Change, CommitReceipt, Document, EntityId, Result, StorageError, StorageErrorKind, Version,
    store::{DocumentStore, validate_changes},
};

#[derive(Debug, Clone, Default)]
struct Collection {
    documents: BTreeMap<EntityId, Document>,
    last_id: i64,
}

impl Collection {
    fn key_taken(&self, key: &str) -> bool {
        self.documents
            .values()
            .any(|doc| doc.key.as_deref() == Some(key))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, Collection>,
    pending_failures: u32,
    failure_kind: Option<StorageErrorKind>,
    commit_attempts: u64,
}

/// In-memory document store for tests and local runs.
///
/// Commits are applied to a working copy that replaces the live state only
/// when every change succeeds, so a failed commit leaves nothing behind.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail with an error of the given kind.
    pub async fn fail_next_commits(&self, count: u32, kind: StorageErrorKind) {
        let mut state = self.state.write().await;
        state.pending_failures = count;
        state.failure_kind = Some(kind);
    }

    /// Returns how many times `commit` has been called, failed attempts included.
    pub async fn commit_attempts(&self) -> u64 {
        self.state.read().await.commit_attempts
    }

    /// Returns the number of documents stored in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.state
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    fn injected_failure(kind: StorageErrorKind) -> StorageError {
        match kind {
            StorageErrorKind::Transient => {
                StorageError::Unavailable("injected transient failure".to_string())
            }
            StorageErrorKind::Permanent => {
                StorageError::InvalidChange("injected permanent failure".to_string())
            }
        }
    }

    fn apply(
        collections: &mut HashMap<String, Collection>,
        change: Change,
        receipt: &mut CommitReceipt,
    ) -> Result<()> {
        let now = Utc::now();
        match change {
            Change::Insert {
                collection,
                key,
                body,
            } => {
                let target = collections.entry(collection.clone()).or_default();
                if let Some(ref key) = key
                    && target.key_taken(key)
                {
                    return Err(StorageError::DuplicateKey {
                        collection,
                        key: key.clone(),
                    });
                }

                target.last_id += 1;
                let id = EntityId::new(target.last_id);
                target.documents.insert(
                    id,
                    Document {
                        collection,
                        id,
                        key,
                        version: Version::first(),
                        updated_at: now,
                        body,
                    },
                );
                receipt.inserted.push(id);
            }
            Change::Update {
                collection,
                id,
                expected,
                body,
            } => {
                let doc = collections
                    .get_mut(&collection)
                    .and_then(|c| c.documents.get_mut(&id));
                let Some(doc) = doc else {
                    return Err(StorageError::ConcurrencyConflict {
                        collection,
                        id,
                        expected,
                        actual: Version::initial(),
                    });
                };
                if doc.version != expected {
                    return Err(StorageError::ConcurrencyConflict {
                        collection,
                        id,
                        expected,
                        actual: doc.version,
                    });
                }
                doc.version = doc.version.next();
                doc.updated_at = now;
                doc.body = body;
            }
            Change::Delete {
                collection,
                id,
                expected,
            } => {
                let actual = collections
                    .get(&collection)
                    .and_then(|c| c.documents.get(&id))
                    .map_or(Version::initial(), |doc| doc.version);
                if actual != expected {
                    return Err(StorageError::ConcurrencyConflict {
                        collection,
                        id,
                        expected,
                        actual,
                    });
                }
                if let Some(target) = collections.get_mut(&collection) {
                    target.documents.remove(&id);
                }
            }
        }

        receipt.applied += 1;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: EntityId) -> Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|c| c.documents.get(&id))
            .cloned())
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.collections.get(collection).and_then(|c| {
            c.documents
                .values()
                .find(|doc| doc.key.as_deref() == Some(key))
                .cloned()
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .map(|c| c.documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<CommitReceipt> {
        validate_changes(&changes)?;

        let mut state = self.state.write().await;
        state.commit_attempts += 1;

        if state.pending_failures > 0
            && let Some(kind) = state.failure_kind
        {
            state.pending_failures -= 1;
            return Err(Self::injected_failure(kind));
        }

        let mut working = state.collections.clone();
        let mut receipt = CommitReceipt::default();
        for change in changes {
            Self::apply(&mut working, change, &mut receipt)?;
        }
        state.collections = working;

        Ok(receipt)
    }
}
