//! Typed error handling for the bookstore service
//!
//! Every fallible operation in the service layer returns a [`BookstoreError`].
//! The variants mirror the categories a client has to tell apart:
//!
//! - [`BookstoreError::NotFound`]: a referenced book, order, cart row or address is absent
//! - [`BookstoreError::InvalidInput`]: missing or malformed request data (empty cart, no address)
//! - [`BookstoreError::Unauthorized`]: no identity, or acting on another user's order
//! - [`BookstoreError::Forbidden`]: administrative capability requested without an admin identity
//! - [`BookstoreError::InvalidState`]: an order status transition that the lifecycle forbids
//! - [`BookstoreError::Conflict`]: a uniqueness constraint (duplicate favorite)
//! - [`BookstoreError::Storage`]: the persistent store failed, the only 500
//!
//! # Example
//!
//! ```rust,ignore
//! match orders.cancel(user_id, order_id).await {
//!     Ok(order) => println!("cancelled {}", order.id),
//!     Err(BookstoreError::InvalidState(e)) => println!("too late: {}", e),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::core::model::OrderStatus;

/// The main error type of the service layer
#[derive(Debug)]
pub enum BookstoreError {
    /// A referenced resource does not exist
    NotFound(NotFoundError),

    /// The request is missing data or carries invalid data
    InvalidInput(InputError),

    /// The caller has no identity or does not own the resource
    Unauthorized(String),

    /// The caller is authenticated but lacks the required role
    Forbidden(String),

    /// The order lifecycle forbids the requested transition
    InvalidState(TransitionError),

    /// A uniqueness constraint was violated
    Conflict(String),

    /// The underlying store failed
    Storage(anyhow::Error),
}

impl fmt::Display for BookstoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookstoreError::NotFound(e) => write!(f, "{}", e),
            BookstoreError::InvalidInput(e) => write!(f, "{}", e),
            BookstoreError::Unauthorized(msg) => write!(f, "{}", msg),
            BookstoreError::Forbidden(msg) => write!(f, "{}", msg),
            BookstoreError::InvalidState(e) => write!(f, "{}", e),
            BookstoreError::Conflict(msg) => write!(f, "{}", msg),
            BookstoreError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for BookstoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookstoreError::NotFound(e) => Some(e),
            BookstoreError::InvalidInput(e) => Some(e),
            BookstoreError::InvalidState(e) => Some(e),
            BookstoreError::Storage(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl BookstoreError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookstoreError::NotFound(_) => StatusCode::NOT_FOUND,
            BookstoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BookstoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BookstoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookstoreError::InvalidState(_) => StatusCode::CONFLICT,
            BookstoreError::Conflict(_) => StatusCode::CONFLICT,
            BookstoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BookstoreError::NotFound(_) => "NOT_FOUND",
            BookstoreError::InvalidInput(_) => "INVALID_INPUT",
            BookstoreError::Unauthorized(_) => "UNAUTHORIZED",
            BookstoreError::Forbidden(_) => "FORBIDDEN",
            BookstoreError::InvalidState(_) => "INVALID_STATE",
            BookstoreError::Conflict(_) => "CONFLICT",
            BookstoreError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            BookstoreError::NotFound(e) => Some(serde_json::json!({
                "resource": e.resource,
                "id": e.id.map(|id| id.to_string()),
            })),
            BookstoreError::InvalidInput(InputError::Fields(errors)) => serde_json::to_value(errors)
                .ok()
                .map(|fields| serde_json::json!({ "fields": fields })),
            BookstoreError::InvalidState(e) => Some(serde_json::json!({
                "from": e.from,
                "to": e.to,
            })),
            _ => None,
        }
    }

    // Shorthand constructors used across the service layer

    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        BookstoreError::NotFound(NotFoundError {
            resource,
            id: Some(id),
        })
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        BookstoreError::InvalidInput(InputError::Message(message.into()))
    }

    pub fn storage(err: anyhow::Error) -> Self {
        BookstoreError::Storage(err)
    }
}

impl IntoResponse for BookstoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = std::result::Result<T, BookstoreError>;

// =============================================================================
// Not Found
// =============================================================================

/// A referenced resource could not be resolved
#[derive(Debug, thiserror::Error)]
#[error("{} not found", capitalize(.resource))]
pub struct NotFoundError {
    pub resource: &'static str,
    pub id: Option<Uuid>,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Invalid Input
// =============================================================================

/// Errors related to request validation
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A single human-readable problem ("Cart is empty", "Address is required")
    #[error("{0}")]
    Message(String),

    /// Field-level validation failures
    #[error("Validation failed: {0}")]
    Fields(validator::ValidationErrors),

    /// The body could not be parsed into the expected command
    #[error("Invalid request body: {0}")]
    Body(String),

    /// A path segment is not a valid identifier
    #[error("Invalid id format: '{0}'")]
    InvalidId(String),
}

// =============================================================================
// Invalid State
// =============================================================================

/// A status transition the order lifecycle does not allow
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub message: String,
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<validator::ValidationErrors> for BookstoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        BookstoreError::InvalidInput(InputError::Fields(err))
    }
}

impl From<JsonRejection> for BookstoreError {
    fn from(rejection: JsonRejection) -> Self {
        BookstoreError::InvalidInput(InputError::Body(rejection.body_text()))
    }
}
