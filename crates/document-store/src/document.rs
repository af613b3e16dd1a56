use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Version number of a stored document, used for optimistic concurrency control.
///
/// A document is created at version 1 and every committed update bumps the
/// version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) of a document that does not exist.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) of a freshly inserted document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A persisted JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Collection the document belongs to (e.g., "students", "courses").
    pub collection: String,

    /// Identity assigned by the store on insert.
    pub id: EntityId,

    /// Optional natural key, unique within the collection.
    pub key: Option<String>,

    /// Current version of the document.
    pub version: Version,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The document body.
    pub body: serde_json::Value,
}

impl Document {
    /// Deserializes the body into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

/// A staged mutation, applied when the owning unit of work commits.
#[derive(Debug, Clone)]
pub enum Change {
    /// Creates a new document; the store assigns its identity.
    Insert {
        collection: String,
        key: Option<String>,
        body: serde_json::Value,
    },

    /// Replaces the body of a document loaded at `expected`.
    Update {
        collection: String,
        id: EntityId,
        expected: Version,
        body: serde_json::Value,
    },

    /// Removes a document loaded at `expected`.
    Delete {
        collection: String,
        id: EntityId,
        expected: Version,
    },
}

impl Change {
    /// Returns the collection this change targets.
    pub fn collection(&self) -> &str {
        match self {
            Change::Insert { collection, .. }
            | Change::Update { collection, .. }
            | Change::Delete { collection, .. } => collection,
        }
    }

    /// Returns a short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Insert { .. } => "insert",
            Change::Update { .. } => "update",
            Change::Delete { .. } => "delete",
        }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Identities assigned to inserted documents, in staging order.
    pub inserted: Vec<EntityId>,

    /// Number of changes applied.
    pub applied: usize,
}

impl CommitReceipt {
    /// Returns the identity assigned to the first inserted document.
    pub fn first_inserted(&self) -> Option<EntityId> {
        self.inserted.first().copied()
    }
}
