//! # Pricing Module
//!
//! Turns a base price, an optional coupon and the commission rate into a
//! reconciled [`PriceBreakdown`].
//!
//! ## Pipeline
//! ```text
//! base price ──► validate (> 0)
//!                   │
//!                   ▼
//!   coupon? ──► check_coupon (inactive / expired / exhausted)
//!                   │
//!                   ▼
//!   discount = min(raw_discount, base)
//!   final    = base - discount
//!   fee      = round(final × commission)
//!   earnings = round(final × (100% - commission))
//! ```
//!
//! Lookups (commission setting, coupon row) happen in the service layer; this
//! module only sees their results, which keeps it deterministic: identical
//! inputs always produce identical breakdowns.

use chrono::{DateTime, Utc};

use crate::error::{PricingError, PricingResult};
use crate::money::Money;
use crate::types::{Coupon, PriceBreakdown, Rate};
use crate::validation::validate_base_price;

/// Checks that `coupon` may be applied at `now`.
///
/// Order matters: an inactive coupon is reported as invalid even if it has
/// also expired, so deactivated codes never leak their expiry.
pub fn check_coupon(coupon: &Coupon, now: DateTime<Utc>) -> PricingResult<()> {
    if !coupon.is_active {
        return Err(PricingError::InvalidCoupon(coupon.code.clone()));
    }
    if coupon.is_expired(now) {
        return Err(PricingError::CouponExpired(coupon.code.clone()));
    }
    if coupon.is_exhausted() {
        return Err(PricingError::CouponExhausted(coupon.code.clone()));
    }
    Ok(())
}

/// Computes the price breakdown for `base` with an optional, already
/// looked-up coupon.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use rihla_core::pricing::compute_breakdown;
/// use rihla_core::{Coupon, DiscountType, Money, Rate};
///
/// let save10 = Coupon {
///     code: "SAVE10".to_string(),
///     discount_type: DiscountType::Percentage,
///     value: 1000,
///     max_usage: Some(100),
///     current_usage: 5,
///     expires_at: None,
///     is_active: true,
/// };
///
/// let b = compute_breakdown(Money::from_cents(20000), Some(&save10), Rate::from_bps(1000), Utc::now())
///     .unwrap();
/// assert_eq!(b.discount_amount.cents(), 2000);
/// assert_eq!(b.final_price.cents(), 18000);
/// assert_eq!(b.platform_fee.cents(), 1800);
/// assert_eq!(b.provider_earnings.cents(), 16200);
/// ```
pub fn compute_breakdown(
    base: Money,
    coupon: Option<&Coupon>,
    commission_rate: Rate,
    now: DateTime<Utc>,
) -> PricingResult<PriceBreakdown> {
    validate_base_price(base)?;

    let discount_amount = match coupon {
        Some(coupon) => {
            check_coupon(coupon, now)?;
            // A coupon can never push the price below zero
            coupon.raw_discount(base).min(base)
        }
        None => Money::zero(),
    };

    let final_price = base - discount_amount;

    Ok(PriceBreakdown {
        original_price: base,
        discount_amount,
        final_price,
        platform_fee: final_price.percentage(commission_rate),
        provider_earnings: final_price.percentage(commission_rate.complement()),
        coupon_code: coupon.map(|c| c.code.clone()),
        commission_rate,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
