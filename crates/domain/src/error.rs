//! Service-level error types.

use document_store::StorageError;
use thiserror::Error;

use crate::student::StudentError;

/// Errors returned by command and query handlers.
///
/// `Rejected` and `Unavailable` are ordinary failures the caller can show to
/// a user. `Storage` and `NotRegistered` are fatal: they indicate broken
/// infrastructure or a missing registration, not a bad request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request violates a domain rule.
    #[error("{0}")]
    Rejected(#[from] StudentError),

    /// Transient storage failures persisted through every retry attempt.
    #[error("Storage is unavailable after {attempts} attempts, please try again later")]
    Unavailable { attempts: u32 },

    /// An error occurred in the document store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No handler was registered for the request type.
    #[error("No handler registered for {request}")]
    NotRegistered { request: &'static str },
}

impl ServiceError {
    /// Returns true for errors that are not ordinary request failures.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(_) | ServiceError::NotRegistered { .. }
        )
    }

    /// Returns true if the error is a storage failure worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Storage(err) if err.is_transient())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Storage(StorageError::Serialization(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::{EntityId, StorageError};

    #[test]
    fn domain_failures_are_not_fatal() {
        let err = ServiceError::from(StudentError::StudentNotFound(EntityId::new(4)));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "No student found for Id 4");
    }

    #[test]
    fn exhausted_retries_are_not_fatal() {
        let err = ServiceError::Unavailable { attempts: 3 };
        assert!(!err.is_fatal());
        assert!(!err.is_transient());
    }

    #[test]
    fn storage_and_registration_errors_are_fatal() {
        assert!(ServiceError::from(StorageError::Unavailable("down".to_string())).is_fatal());
        assert!(ServiceError::NotRegistered { request: "Enroll" }.is_fatal());
    }

    #[test]
    fn transient_detection_looks_through_storage_errors() {
        let transient = ServiceError::from(StorageError::Unavailable("down".to_string()));
        let permanent = ServiceError::from(StorageError::InvalidChange("bad".to_string()));
        assert!(transient.is_transient());
        assert!(!permanent.is_transient());
    }
}
