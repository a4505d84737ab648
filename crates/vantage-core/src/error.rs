//! # Error Types
//!
//! Domain-specific error types for vantage-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vantage-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations + port failures       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vantage-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, converted into CoreError    │
//! │                                                                         │
//! │  REST errors (apps/api)                                                │
//! │  └── ApiError         - What clients see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! │                 DbError ──┘                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable at the request boundary. Nothing here is a
//! reason to crash the process.

use thiserror::Error;

use crate::money::Money;
use crate::types::{OrderStatus, PaymentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Create order (line 2: qty 5)
    ///      │
    ///      ▼
    /// reserve(product, 5): available=3
    ///      │
    ///      ▼
    /// release line 1, InsufficientStock { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Client shows: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Quantity below one.
    #[error("Invalid quantity {quantity}: must be at least 1")]
    InvalidQuantity { quantity: i64 },

    /// Loyalty redemption larger than the balance.
    #[error("Insufficient loyalty points: available {available}, requested {requested}")]
    InsufficientPoints { available: i64, requested: i64 },

    /// A payment would push completed payments past the order total.
    #[error("Payment of {requested} exceeds remaining balance {remaining} on order {order_id}")]
    ExceedsOrderTotal {
        order_id: String,
        requested: Money,
        remaining: Money,
    },

    /// Refund amount is zero or negative.
    #[error("Invalid refund amount {amount}: must be positive")]
    InvalidRefundAmount { amount: Money },

    /// Refund larger than what is still refundable.
    #[error("Refund of {requested} exceeds refundable amount {refundable} on order {order_id}")]
    ExceedsPaidAmount {
        order_id: String,
        requested: Money,
        refundable: Money,
    },

    /// Status text is not one of the known order statuses.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// Transition not allowed from the order's current status.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Order no longer accepts new payments.
    #[error("Order {order_id} is {status} and does not accept payments")]
    OrderClosed {
        order_id: String,
        status: OrderStatus,
    },

    /// Payment is not in a state that allows the requested operation.
    #[error("Payment {payment_id} is {status}, expected PENDING")]
    InvalidPaymentState {
        payment_id: String,
        status: PaymentStatus,
    },

    /// Settlement details do not fit the payment (wrong method, short tender).
    #[error("Settlement rejected: {reason}")]
    SettlementRejected { reason: String },

    /// Entity lookup failed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A concurrent writer changed the same row first.
    ///
    /// ## When This Occurs
    /// - Optimistic version check on an order update fails
    /// - SQLite reports the database as locked
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence collaborator failed unexpectedly.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a SettlementRejected error.
    pub fn settlement(reason: impl Into<String>) -> Self {
        CoreError::SettlementRejected {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, card digits).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection has too many entries.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
