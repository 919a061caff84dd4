//! Unified error types for the Shokher API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and persistence errors
//! - `CourierError`: Steadfast courier API client errors
//! - `StorageError`: Object storage errors
//! - `FilterParseError`: Query-string filter grammar errors
//! - `AppError`: Application layer errors rendered as the response envelope

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Steadfast courier API client errors
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized - invalid courier credentials")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Courier rejected the request: {0}")]
    Rejected(String),
}

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

/// Errors from the `key=value&...||...` filter grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("filter expression is empty")]
    Empty,

    #[error("empty term in filter expression")]
    EmptyTerm,

    #[error("missing '=' in term: {0}")]
    MissingEquals(String),

    #[error("invalid field name: {0:?}")]
    InvalidField(String),

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("malformed group: {0}")]
    MalformedGroup(String),

    #[error("groups may only be nested one level deep")]
    NestedGroup,
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Courier error: {0}")]
    Courier(#[from] CourierError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterParseError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and client-facing message for this error
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Domain(DomainError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Domain(DomainError::AlreadyExists(msg)) => {
                (StatusCode::CONFLICT, msg.clone())
            }
            AppError::Domain(DomainError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Domain(DomainError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Courier(e) => {
                tracing::error!("Courier error: {}", e);
                match e {
                    CourierError::Rejected(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
                    CourierError::Api { status, message } if *status == 422 => {
                        (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
                    }
                    CourierError::RateLimited => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "Courier rate limit reached".to_string(),
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "Courier service error".to_string(),
                    ),
                }
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                match e {
                    StorageError::InvalidPath(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                    StorageError::Io(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to store file".to_string(),
                    ),
                }
            }
            AppError::Filter(e) => (StatusCode::BAD_REQUEST, format!("Invalid filter: {}", e)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        ApiResponse::error(status, message).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_not_found_maps_to_404() {
        let (status, message) =
            AppError::Domain(DomainError::NotFound("Order abc not found".into()))
                .status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Order abc not found");
    }

    #[test]
    fn validation_maps_to_400() {
        let (status, _) =
            AppError::Domain(DomainError::Validation("bad".into())).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let (status, message) =
            AppError::Domain(DomainError::Database("relation missing".into()))
                .status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("relation"));
    }

    #[test]
    fn courier_failures_map_to_bad_gateway() {
        let (status, _) = AppError::Courier(CourierError::Unauthorized).status_and_message();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn filter_errors_are_bad_requests() {
        let (status, message) =
            AppError::Filter(FilterParseError::UnbalancedParentheses).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("unbalanced"));
    }
}
