//! # Validation Module
//!
//! Input normalization and validation for Rihla.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (serde deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Canonical coupon / ticket codes                                   │
//! │  └── Price, rate and order reference rules                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(code), UNIQUE(ticket_code)                                 │
//! │  └── CHECK constraints on lifecycle invariants                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Coupon, DiscountType};
use crate::BPS_SCALE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest coupon code accepted.
pub const MAX_COUPON_CODE_LEN: usize = 64;

// =============================================================================
// Code Normalization
// =============================================================================

/// Canonical form of a user-supplied coupon code.
///
/// ## Rules
/// - Surrounding whitespace is trimmed
/// - Letters are uppercased (Unicode-aware)
/// - A blank code means "no coupon" and yields `None`
///
/// ## Example
/// ```rust
/// use rihla_core::validation::normalize_coupon_code;
///
/// assert_eq!(normalize_coupon_code("  save10 "), Some("SAVE10".to_string()));
/// assert_eq!(normalize_coupon_code("   "), None);
/// ```
pub fn normalize_coupon_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    Some(code.to_uppercase())
}

/// Canonical form of a scanned ticket code (trimmed, uppercased).
///
/// Ticket codes are minted uppercase, so a lowercased scan still matches.
pub fn normalize_ticket_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a base price: must be strictly positive.
///
/// ## Example
/// ```rust
/// use rihla_core::validation::validate_base_price;
/// use rihla_core::Money;
///
/// assert!(validate_base_price(Money::from_cents(1)).is_ok());
/// assert!(validate_base_price(Money::zero()).is_err());
/// ```
pub fn validate_base_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "base price".to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: BPS_SCALE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a coupon before it is stored by admin tooling.
///
/// ## Rules
/// - Code is non-blank, at most 64 characters, already normalized
/// - Percentage values lie in 0..=10000 bps
/// - Fixed values are positive
/// - Usage counters are non-negative
pub fn validate_coupon(coupon: &Coupon) -> ValidationResult<()> {
    match normalize_coupon_code(&coupon.code) {
        None => {
            return Err(ValidationError::Required {
                field: "code".to_string(),
            })
        }
        Some(canonical) if canonical != coupon.code => {
            return Err(ValidationError::InvalidFormat {
                field: "code".to_string(),
                reason: format!("must be stored in canonical form '{}'", canonical),
            })
        }
        Some(_) => {}
    }

    if coupon.code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    match coupon.discount_type {
        DiscountType::Percentage => {
            if !(0..=BPS_SCALE as i64).contains(&coupon.value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: BPS_SCALE as i64,
                });
            }
        }
        DiscountType::Fixed => {
            if coupon.value <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
        }
    }

    if coupon.current_usage < 0 || coupon.max_usage.is_some_and(|max| max < 0) {
        return Err(ValidationError::OutOfRange {
            field: "usage".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Order References
// =============================================================================

/// Extracts the booking id from a processor order reference `<prefix>-<bookingId>`.
///
/// Only the first `-` separates the prefix, so UUID booking ids (which
/// contain dashes themselves) survive intact.
///
/// ## Example
/// ```rust
/// use rihla_core::validation::booking_id_from_order_ref;
///
/// let id = booking_id_from_order_ref("booking-3f2c9a1e-0000-4000-8000-000000000001").unwrap();
/// assert_eq!(id, "3f2c9a1e-0000-4000-8000-000000000001");
/// assert!(booking_id_from_order_ref("nodash").is_err());
/// ```
pub fn booking_id_from_order_ref(order_ref: &str) -> ValidationResult<&str> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "merchant_order_id".to_string(),
        reason: reason.to_string(),
    };

    let (prefix, booking_id) = order_ref
        .trim()
        .split_once('-')
        .ok_or_else(|| invalid("expected <prefix>-<bookingId>"))?;

    if prefix.is_empty() {
        return Err(invalid("prefix is empty"));
    }
    if booking_id.is_empty() {
        return Err(invalid("booking id is empty"));
    }

    Ok(booking_id)
}

// =============================================================================
// Unit Tests
// =============================================================================
