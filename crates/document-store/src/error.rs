use thiserror::Error;

use crate::{EntityId, Version};

/// Whether retrying the failed operation can be expected to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Likely to succeed on a later attempt (unavailability, lost race).
    Transient,
    /// Will fail again regardless of retries (constraint violation, bad data).
    Permanent,
}

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The stored version did not match the version the change was staged against.
    #[error(
        "Concurrency conflict on {collection}/{id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        collection: String,
        id: EntityId,
        expected: Version,
        actual: Version,
    },

    /// Another document in the collection already owns the natural key.
    #[error("Duplicate key '{key}' in {collection}")]
    DuplicateKey { collection: String, key: String },

    /// The store could not be reached or refused the operation for now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A staged change is malformed.
    #[error("Invalid change: {0}")]
    InvalidChange(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Classifies the error for retry decisions.
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::ConcurrencyConflict { .. } | StorageError::Unavailable(_) => {
                StorageErrorKind::Transient
            }
            StorageError::Database(err) => classify_sqlx(err),
            StorageError::DuplicateKey { .. }
            | StorageError::InvalidChange(_)
            | StorageError::Migration(_)
            | StorageError::Serialization(_) => StorageErrorKind::Permanent,
        }
    }

    /// Returns true if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == StorageErrorKind::Transient
    }
}

/// Serialization failures and deadlocks are resolved by re-running the transaction.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

fn classify_sqlx(err: &sqlx::Error) -> StorageErrorKind {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageErrorKind::Transient,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => StorageErrorKind::Transient,
            _ => StorageErrorKind::Permanent,
        },
        _ => StorageErrorKind::Permanent,
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StorageError>;
