//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ├── PricingError   ──► 400 / 503 / 500                         │
//! │         ├── LifecycleError ──► 400 / 401 / 404 / 409 / 500             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  IntoResponse: { "success": false, "code": "...", "error": "..." }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are logged with full detail here and reach the client
//! only as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rihla_core::PricingError;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::services::lifecycle::LifecycleError;

/// Error returned from HTTP handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Coupon unknown or inactive (400)
    InvalidCoupon,

    /// Coupon past its expiry (400)
    CouponExpired,

    /// Coupon usage limit reached (400)
    CouponExhausted,

    /// Webhook signature missing or wrong (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// Request conflicts with current state (409)
    Conflict,

    /// Required configuration missing (503)
    ConfigurationError,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidCoupon
            | ErrorCode::CouponExpired
            | ErrorCode::CouponExhausted => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ConfigurationError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "code": self.code,
            "error": self.message,
        }));
        (self.code.status(), body).into_response()
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidInput(e) => ApiError::validation(e.to_string()),
            PricingError::InvalidCoupon(_) => ApiError::new(ErrorCode::InvalidCoupon, err.to_string()),
            PricingError::CouponExpired(_) => ApiError::new(ErrorCode::CouponExpired, err.to_string()),
            PricingError::CouponExhausted(_) => {
                ApiError::new(ErrorCode::CouponExhausted, err.to_string())
            }
            PricingError::Configuration(reason) => {
                error!(%reason, "Pricing configuration missing");
                ApiError::new(ErrorCode::ConfigurationError, "Pricing is not configured")
            }
            PricingError::Store(reason) => {
                error!(%reason, "Pricing store failed");
                ApiError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}

/// Webhook errors go back to the payment processor, so messages stay
/// generic.
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Unauthorized(_) => {
                ApiError::new(ErrorCode::Unauthorized, "Invalid signature")
            }
            LifecycleError::MalformedEvent(_) => {
                ApiError::validation("Malformed payment event")
            }
            LifecycleError::BookingNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "Booking not found")
            }
            LifecycleError::InvalidState { .. } => {
                ApiError::new(ErrorCode::Conflict, "Booking cannot be confirmed")
            }
            LifecycleError::Persistence(reason) => {
                error!(%reason, "Booking store failed during payment confirmation");
                ApiError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}
