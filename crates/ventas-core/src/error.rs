//! # Error Types
//!
//! Domain-specific error types for ventas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ventas-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ventas-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  ├── ServiceError     - Union seen by services (core + db + auth)      │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderState;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. The HTTP layer maps each
/// variant to a status code; nothing here is ever retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A referenced entity does not exist (or is inactive where an active
    /// record is required).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Some of the products referenced by an order could not be resolved.
    #[error("Some products not found: {missing:?}")]
    ProductsNotFound { missing: Vec<i64> },

    /// Requested quantity exceeds the product's current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Create order (product 7, qty: 100)
    ///      │
    ///      ▼
    /// Check stock: available=50
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 7, available: 50, required: 100 }
    ///      │
    ///      ▼
    /// Client shows: "Only 50 of LAP-001 in stock"
    /// ```
    #[error("Insufficient stock for {code} (product {product_id}): available {available}, required {required}")]
    InsufficientStock {
        product_id: i64,
        code: String,
        available: i64,
        required: i64,
    },

    /// The order state machine does not allow this move.
    #[error("Invalid order state transition from {from} to {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    /// Cancelling an order that is already cancelled.
    #[error("Order {order_id} is already cancelled")]
    AlreadyCancelled { order_id: i64 },

    /// Cancelling an order that has been delivered.
    #[error("Order {order_id} has been delivered and cannot be cancelled")]
    CannotCancelDelivered { order_id: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic or SQL runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn too_long(field: &str, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.to_string(),
            max,
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
