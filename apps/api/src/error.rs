//! # API Error Types
//!
//! Errors raised by services and the JSON shape HTTP clients receive.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Ventas                                 │
//! │                                                                         │
//! │  Repository ─── DbError ──────┐                                        │
//! │                               │                                         │
//! │  Core rules ─── CoreError ────┼──► ServiceError ──► ApiError ──► JSON  │
//! │                               │                     (status + code)     │
//! │  JWT / crypto ────────────────┘                                        │
//! │                                                                         │
//! │  HTTP/1.1 422                                                           │
//! │  {                                                                      │
//! │    "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for LAP-001 ...",                     │
//! │    "details": { "product_id": 3, "available": 2, "required": 5 }        │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use ventas_core::{CoreError, ValidationError};
use ventas_db::DbError;

// =============================================================================
// Service Error
// =============================================================================

/// Errors returned by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// Missing, malformed, expired or foreign token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    InactiveAccount,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Error body sent to HTTP clients.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: 42" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context, when the error has any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    #[serde(skip)]
    pub status: StatusCode,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Malformed request body or parameters (400)
    BadRequest,

    /// Unique value already taken (409)
    DuplicateKey,

    /// Row still referenced elsewhere (409)
    Conflict,

    /// Not enough units (422)
    InsufficientStock,

    /// Order workflow refused the move (409)
    InvalidTransition,

    /// Order was cancelled before (409)
    AlreadyCancelled,

    /// Delivered orders stay delivered (409)
    CannotCancelDelivered,

    /// Missing or bad credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Anything the client cannot fix (500)
    Internal,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
            status,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    /// Hides the cause from the client and logs it instead.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "internal server error");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::NotFound { entity, id } => {
                ApiError::not_found(message).with_details(json!({ "entity": entity, "id": id }))
            }
            CoreError::ProductsNotFound { missing } => {
                ApiError::not_found(message).with_details(json!({ "missing": missing }))
            }
            CoreError::InsufficientStock {
                product_id,
                code,
                available,
                required,
            } => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::InsufficientStock,
                message,
            )
            .with_details(json!({
                "product_id": product_id,
                "code": code,
                "available": available,
                "required": required,
            })),
            CoreError::InvalidTransition { from, to } => {
                ApiError::new(StatusCode::CONFLICT, ErrorCode::InvalidTransition, message)
                    .with_details(json!({ "from": from, "to": to }))
            }
            CoreError::AlreadyCancelled { order_id } => {
                ApiError::new(StatusCode::CONFLICT, ErrorCode::AlreadyCancelled, message)
                    .with_details(json!({ "order_id": order_id }))
            }
            CoreError::CannotCancelDelivered { order_id } => {
                ApiError::new(StatusCode::CONFLICT, ErrorCode::CannotCancelDelivered, message)
                    .with_details(json!({ "order_id": order_id }))
            }
            CoreError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rule(core) => core.into(),
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} not found: {id}"))
                    .with_details(json!({ "entity": entity, "id": id }))
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::DuplicateKey,
                format!("{field} '{value}' already exists"),
            )
            .with_details(json!({ "field": field, "value": value })),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "foreign key violation");
                ApiError::new(
                    StatusCode::CONFLICT,
                    ErrorCode::Conflict,
                    "Record is referenced by other records",
                )
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            ServiceError::Db(db) => db.into(),
            ServiceError::InvalidToken | ServiceError::InvalidCredentials => {
                ApiError::unauthorized(err.to_string())
            }
            ServiceError::InactiveAccount | ServiceError::Forbidden(_) => {
                ApiError::forbidden(err.to_string())
            }
            ServiceError::Crypto(_) | ServiceError::Internal(_) => ApiError::internal(err),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
