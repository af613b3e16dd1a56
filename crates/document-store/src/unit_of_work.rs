use crate::{Change, CommitReceipt, Document, DocumentStore, EntityId, Result, Version};

/// A single-use transactional scope over a document store.
///
/// Reads go straight to committed state. Writes are staged and only reach the
/// store when [`UnitOfWork::commit`] runs, which consumes the scope so it can
/// never be reused. Dropping an uncommitted unit of work discards its changes.
pub struct UnitOfWork<S: DocumentStore> {
    store: S,
    changes: Vec<Change>,
}

impl<S: DocumentStore> UnitOfWork<S> {
    /// Opens a fresh scope over the given store.
    pub fn begin(store: S) -> Self {
        Self {
            store,
            changes: Vec::new(),
        }
    }

    /// Loads a document by identity.
    pub async fn get(&self, collection: &str, id: EntityId) -> Result<Option<Document>> {
        self.store.get(collection, id).await
    }

    /// Loads a document by natural key.
    pub async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        self.store.find_by_key(collection, key).await
    }

    /// Loads every document of a collection.
    pub async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.store.list(collection).await
    }

    /// Stages a new document.
    pub fn insert(
        &mut self,
        collection: impl Into<String>,
        key: Option<String>,
        body: serde_json::Value,
    ) {
        self.changes.push(Change::Insert {
            collection: collection.into(),
            key,
            body,
        });
    }

    /// Stages a replacement body for a document loaded at `expected`.
    pub fn update(
        &mut self,
        collection: impl Into<String>,
        id: EntityId,
        expected: Version,
        body: serde_json::Value,
    ) {
        self.changes.push(Change::Update {
            collection: collection.into(),
            id,
            expected,
            body,
        });
    }

    /// Stages removal of a document loaded at `expected`.
    pub fn delete(&mut self, collection: impl Into<String>, id: EntityId, expected: Version) {
        self.changes.push(Change::Delete {
            collection: collection.into(),
            id,
            expected,
        });
    }

    /// Returns the number of staged changes.
    pub fn pending(&self) -> usize {
        self.changes.len()
    }

    /// Applies every staged change atomically.
    ///
    /// A scope with nothing staged commits without touching the store.
    #[tracing::instrument(skip(self), fields(changes = self.changes.len()))]
    pub async fn commit(self) -> Result<CommitReceipt> {
        if self.changes.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let started = std::time::Instant::now();
        let result = self.store.commit(self.changes).await;
        metrics::histogram!("unit_of_work_commit_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(receipt) => tracing::debug!(applied = receipt.applied, "unit of work committed"),
            Err(err) => tracing::debug!(error = %err, transient = err.is_transient(), "commit failed"),
        }

        result
    }
}
