//! Error handling module
//!
//! Defines error types and handling logic used in the project

use crate::store::StoreError;
use crate::utils::response::{error_response, graphql_error_response};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
///
/// The `Display` output of each variant is the exact message placed in the
/// response envelope, so upstream messages pass through unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client input shape violation
    #[error("{0}")]
    Validation(String),

    /// Missing or unusable server configuration (e.g. no API key)
    #[error("{0}")]
    Configuration(String),

    /// Upstream completion API failure
    #[error("{0}")]
    Upstream(String),

    /// Malformed JSON in the inbound request
    #[error("Invalid JSON body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request body over the configured size limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// GraphQL query matched no known operation
    #[error("Unsupported GraphQL operation")]
    UnsupportedOperation,

    /// No key-value store configured
    #[error("KV storage not configured")]
    StorageUnavailable,

    /// Key-value store failure
    #[error("{0}")]
    Storage(#[from] StoreError),

    /// Unknown path
    #[error("Not found")]
    NotFound,

    /// Known path, wrong method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// REST error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
}

/// GraphQL error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlErrorResponse {
    /// Always null on error
    pub data: Option<serde_json::Value>,
    /// Error list
    pub errors: Vec<GraphqlError>,
}

/// Single GraphQL error entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Configuration(_)
            | AppError::Upstream(_)
            | AppError::Serialization(_)
            | AppError::UnsupportedOperation => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error kind string, used in logs only
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Serialization(_) => "validation_error",
            AppError::PayloadTooLarge => "payload_too_large",
            AppError::Configuration(_) => "configuration_error",
            AppError::Upstream(_) => "upstream_error",
            AppError::UnsupportedOperation => "unsupported_operation",
            AppError::StorageUnavailable | AppError::Storage(_) => "storage_error",
            AppError::NotFound => "not_found",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether the error is worth logging at error level
    pub fn should_log_details(&self) -> bool {
        !matches!(self, AppError::NotFound | AppError::MethodNotAllowed)
    }

    /// Convert to the REST envelope
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            timestamp: crate::utils::timestamp::now_iso(),
        }
    }

    /// Convert to the GraphQL envelope
    pub fn to_graphql_response(&self) -> GraphqlErrorResponse {
        GraphqlErrorResponse {
            data: None,
            errors: vec![GraphqlError {
                message: self.to_string(),
            }],
        }
    }

    /// Render as a GraphQL error response (always HTTP 400)
    pub fn into_graphql_response(self) -> Response {
        tracing::warn!("GraphQL error: {} ({})", self, self.error_type());
        graphql_error_response(&self.to_graphql_response())
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::debug!("Routing error: {} - Status code: {}", self.error_type(), status);
        }

        error_response(&self.to_error_response(), status)
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
