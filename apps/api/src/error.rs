//! # API Error Handling
//!
//! Every handler returns `Result<T, ApiError>`; the error serializes as
//!
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for p-1: ..." }
//! ```
//!
//! and carries the HTTP status derived from its code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use vantage_core::CoreError;

/// Machine-readable error codes for API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    InvalidQuantity,
    InsufficientPoints,
    ExceedsOrderTotal,
    InvalidRefundAmount,
    ExceedsPaidAmount,
    InvalidStatus,
    InvalidTransition,
    OrderClosed,
    InvalidPaymentState,
    SettlementRejected,
    Conflict,
    Unauthorized,
    Forbidden,
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// API error returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            CoreError::InsufficientPoints { .. } => ErrorCode::InsufficientPoints,
            CoreError::ExceedsOrderTotal { .. } => ErrorCode::ExceedsOrderTotal,
            CoreError::InvalidRefundAmount { .. } => ErrorCode::InvalidRefundAmount,
            CoreError::ExceedsPaidAmount { .. } => ErrorCode::ExceedsPaidAmount,
            CoreError::InvalidStatus(_) => ErrorCode::InvalidStatus,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::OrderClosed { .. } => ErrorCode::OrderClosed,
            CoreError::InvalidPaymentState { .. } => ErrorCode::InvalidPaymentState,
            CoreError::SettlementRejected { .. } => ErrorCode::SettlementRejected,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::Storage(_) => ErrorCode::InternalError,
        };

        // Storage details stay in the log.
        if code == ErrorCode::InternalError {
            error!(error = %err, "Storage failure");
            return ApiError::internal("An internal error occurred");
        }

        ApiError::new(code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::{Money, ValidationError};

    #[test]
    fn test_business_errors_are_bad_requests() {
        let err: ApiError = CoreError::ExceedsPaidAmount {
            order_id: "o-1".into(),
            requested: Money::from_cents(6000),
            refundable: Money::from_cents(5000),
        }
        .into();

        assert_eq!(err.code, ErrorCode::ExceedsPaidAmount);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = CoreError::not_found("Order", "o-1").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = CoreError::Conflict("busy".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid: ApiError = CoreError::Validation(ValidationError::Required {
            field: "reason".into(),
        })
        .into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_storage_message_is_hidden() {
        let err: ApiError = CoreError::Storage("disk I/O error at /var/db".into()).into();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("/var/db"));
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ApiError::new(ErrorCode::InsufficientStock, "x")).unwrap();
        assert!(json.contains("\"INSUFFICIENT_STOCK\""));
    }
}
