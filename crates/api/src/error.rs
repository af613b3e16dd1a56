//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use domain::ServiceError;
use serde::Serialize;

/// Uniform response body for every student endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub result: Option<T>,
    pub error_message: Option<String>,
    pub time_generated: DateTime<Utc>,
}

impl<T> Envelope<T> {
    /// Wraps a successful result.
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            error_message: None,
            time_generated: Utc::now(),
        }
    }

    /// Wraps a failure reason.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error_message: Some(message.into()),
            time_generated: Utc::now(),
        }
    }
}

impl Envelope<()> {
    /// Success without a payload.
    pub fn empty() -> Self {
        Self {
            result: None,
            error_message: None,
            time_generated: Utc::now(),
        }
    }
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Failure reported by the dispatcher.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) if err.is_fatal() => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Service(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        };

        (status, Json(Envelope::<()>::error(message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EntityId;
    use document_store::StorageError;
    use domain::StudentError;

    #[test]
    fn test_rejection_maps_to_bad_request() {
        let err = ApiError::from(ServiceError::from(StudentError::StudentNotFound(
            EntityId::new(3),
        )));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_exhausted_retries_map_to_bad_request() {
        let err = ApiError::from(ServiceError::Unavailable { attempts: 3 });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fatal_errors_map_to_internal_error() {
        let err = ApiError::from(ServiceError::from(StorageError::InvalidChange(
            "broken".to_string(),
        )));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_keeps_message() {
        let err = ApiError::BadRequest("Invalid ID format: x".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let json = serde_json::to_value(Envelope::<()>::error("Name is required")).unwrap();
        assert_eq!(json["errorMessage"], "Name is required");
        assert!(json["result"].is_null());
        assert!(json["timeGenerated"].is_string());
    }
}
