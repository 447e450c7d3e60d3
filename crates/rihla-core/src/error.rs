//! # Error Types
//!
//! Domain-specific error types for rihla-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rihla-core errors (this file)                                         │
//! │  ├── PricingError     - Price preview failures (user-facing)           │
//! │  ├── RedemptionError  - Ticket scan failures (user-facing)             │
//! │  ├── SignatureError   - Webhook authenticity failures                  │
//! │  ├── TaxQrError       - Tax QR encoding failures (programming errors)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rihla-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (coupon code, field, ...)
//! 3. Each user-facing variant has its own distinct message

use thiserror::Error;

// =============================================================================
// Pricing Error
// =============================================================================

/// Errors returned by the pricing engine.
///
/// Coupon variants are user-correctable and surfaced verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Base price or other input failed validation.
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    /// Commission configuration could not be read and no fallback applies.
    #[error("Pricing configuration unavailable: {0}")]
    Configuration(String),

    /// Coupon does not exist or has been deactivated.
    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),

    /// Coupon expiry date has passed.
    #[error("Coupon {0} has expired")]
    CouponExpired(String),

    /// Coupon has been redeemed `max_usage` times.
    #[error("Coupon {0} has reached its usage limit")]
    CouponExhausted(String),

    /// Backing store failed while looking up pricing data.
    #[error("Pricing data unavailable: {0}")]
    Store(String),
}

// =============================================================================
// Redemption Error
// =============================================================================

/// Ticket redemption failures.
///
/// None of these mutate state.
///
/// ## User Workflow
/// ```text
/// Provider scans ticket
///      │
///      ├── unknown code / cancelled booking ──► InvalidTicket
///      ├── another provider's service ────────► WrongProvider
///      ├── already scanned ───────────────────► AlreadyUsed
///      │
///      ▼
/// Redeemed { service_title }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionError {
    #[error("Invalid ticket")]
    InvalidTicket,

    #[error("This ticket belongs to another provider's service")]
    WrongProvider,

    #[error("Ticket has already been used")]
    AlreadyUsed,

    #[error("Ticket store unavailable: {0}")]
    Store(String),
}

// =============================================================================
// Signature Error
// =============================================================================

/// Webhook authenticity failures. Every variant means "do not process".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Body is not a JSON transaction callback.
    #[error("Webhook payload is not a transaction object: {0}")]
    MalformedPayload(String),

    /// A field that takes part in the signing string is absent or null.
    #[error("Webhook payload is missing signed field `{0}`")]
    MissingField(&'static str),

    /// Supplied signature is not valid hex.
    #[error("Webhook signature is not valid hex")]
    InvalidEncoding,

    /// HMAC did not match.
    #[error("Webhook signature mismatch")]
    Mismatch,
}

// =============================================================================
// Tax QR Error
// =============================================================================

/// Tax QR encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxQrError {
    /// A field exceeds the one-byte TLV length limit.
    #[error("Tax QR field {tag} is {len} bytes, maximum is 255")]
    FieldTooLong { tag: u8, len: usize },

    #[error("Tax QR payload is not valid base64")]
    InvalidBase64,

    #[error("Tax QR payload is malformed: {0}")]
    Malformed(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Invalid format (e.g., malformed order reference).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for pricing results.
pub type PricingResult<T> = Result<T, PricingError>;

/// Convenience type alias for redemption results.
pub type RedemptionResult<T> = Result<T, RedemptionError>;

// =============================================================================
// Unit Tests
// =============================================================================
