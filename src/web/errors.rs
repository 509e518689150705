//! # Web API Errors
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}`, plus a
//! `retryable` flag on conflicts.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::logging::log_error;
use crate::sequencing::SequenceError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    /// `retryable` marks lost concurrency races the client may simply resend
    #[error("Conflict: {message}")]
    Conflict { message: String, retryable: bool },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Order key space exhausted: {message}")]
    KeySpaceExhausted { message: String },

    #[error("Database operation failed: {operation}")]
    DatabaseError { operation: String },

    #[error("Invalid UUID format: {uuid}")]
    InvalidUuid { uuid: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable_conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn database_error(operation: impl Into<String>) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
        }
    }

    pub fn invalid_uuid(uuid: impl Into<String>) -> Self {
        Self::InvalidUuid { uuid: uuid.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } | ApiError::InvalidUuid { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::KeySpaceExhausted { .. }
            | ApiError::DatabaseError { .. }
            | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Parse a path segment as a UUID
pub fn parse_uuid(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_uuid(raw))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if let ApiError::Conflict { message, retryable } = &self {
            let error_response = json!({
                "error": {
                    "code": "CONFLICT",
                    "message": message,
                    "retryable": retryable
                }
            });
            return (status_code, Json(error_response)).into_response();
        }

        let (error_code, message) = match &self {
            ApiError::NotFound { message } => ("NOT_FOUND", message.clone()),
            ApiError::BadRequest { message } => ("BAD_REQUEST", message.clone()),
            ApiError::InvalidUuid { uuid } => ("INVALID_UUID", format!("Invalid UUID: {uuid}")),
            ApiError::ServiceUnavailable => (
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            ApiError::KeySpaceExhausted { message } => {
                ("ORDER_KEY_SPACE_EXHAUSTED", message.clone())
            }
            ApiError::DatabaseError { operation } => ("DATABASE_ERROR", operation.clone()),
            ApiError::Internal => ("INTERNAL_ERROR", "Internal server error".to_string()),
            // Handled above
            ApiError::Conflict { message, .. } => ("CONFLICT", message.clone()),
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<SequenceError> for ApiError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::NotFound { .. } => ApiError::not_found(err.to_string()),
            SequenceError::ConcurrencyConflict { .. } => {
                ApiError::retryable_conflict(err.to_string())
            }
            SequenceError::ExhaustedKeySpace { .. } => ApiError::KeySpaceExhausted {
                message: err.to_string(),
            },
            SequenceError::Database { ref operation, .. } => {
                log_error("sequencing", operation, &err.to_string(), None);
                ApiError::database_error(operation.clone())
            }
            SequenceError::Unavailable { ref operation } => {
                log_error("sequencing", operation, &err.to_string(), None);
                ApiError::ServiceUnavailable
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StoreError::Conflict { message } => ApiError::conflict(message),
            StoreError::Database { ref operation, .. } => {
                log_error("catalog", operation, &err.to_string(), None);
                ApiError::database_error(operation.clone())
            }
            StoreError::Unavailable { ref operation } => {
                log_error("catalog", operation, &err.to_string(), None);
                ApiError::ServiceUnavailable
            }
        }
    }
}
