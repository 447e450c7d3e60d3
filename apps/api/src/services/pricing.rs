//! # Pricing Engine
//!
//! Price previews: coupon validation plus the platform/provider split.
//!
//! ## Flow
//! ```text
//! base price ──► validate ──► commission rate ──► coupon lookup ──► compute_breakdown
//!                   │               │                  │
//!                   ▼               ▼                  ▼
//!             InvalidInput    Configuration /     InvalidCoupon /
//!                             Store (or fallback) Expired / Exhausted
//! ```
//!
//! Previews never mutate state. Coupon usage is only counted when a payment
//! for the booking is confirmed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rihla_core::error::PricingResult;
use rihla_core::pricing::compute_breakdown;
use rihla_core::validation::{normalize_coupon_code, validate_base_price};
use rihla_core::{Money, PriceBreakdown, PricingError, Rate};
use tracing::{debug, warn};

use super::PricingStore;

/// What to do when the commission setting cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionPolicy {
    /// Fail the preview.
    Strict,
    /// Price with this rate and log a warning.
    FallbackTo(Rate),
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        CommissionPolicy::Strict
    }
}

/// Computes price breakdowns from live commission and coupon data.
#[derive(Clone)]
pub struct PricingEngine {
    store: Arc<dyn PricingStore>,
    policy: CommissionPolicy,
}

impl PricingEngine {
    pub fn new(store: Arc<dyn PricingStore>, policy: CommissionPolicy) -> Self {
        Self { store, policy }
    }

    /// Prices `base` with an optional user-supplied coupon code.
    pub async fn compute_price(
        &self,
        base: Money,
        coupon_code: Option<&str>,
    ) -> PricingResult<PriceBreakdown> {
        self.compute_price_at(base, coupon_code, Utc::now()).await
    }

    /// [`compute_price`](Self::compute_price) evaluated at `now`.
    pub async fn compute_price_at(
        &self,
        base: Money,
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> PricingResult<PriceBreakdown> {
        validate_base_price(base)?;

        let rate = self.commission_rate().await?;

        let coupon = match coupon_code.and_then(normalize_coupon_code) {
            Some(code) => {
                let coupon = self
                    .store
                    .coupon(&code)
                    .await
                    .map_err(|e| PricingError::Store(e.to_string()))?
                    .ok_or(PricingError::InvalidCoupon(code))?;
                Some(coupon)
            }
            None => None,
        };

        let breakdown = compute_breakdown(base, coupon.as_ref(), rate, now)?;

        debug!(
            original = %breakdown.original_price,
            discount = %breakdown.discount_amount,
            final_price = %breakdown.final_price,
            coupon = ?breakdown.coupon_code,
            "Price computed"
        );

        Ok(breakdown)
    }

    async fn commission_rate(&self) -> PricingResult<Rate> {
        let failure = match self.store.commission_rate().await {
            Ok(Some(rate)) => return Ok(rate),
            Ok(None) => PricingError::Configuration("commission rate is not set".to_string()),
            Err(e) => PricingError::Store(e.to_string()),
        };

        match self.policy {
            CommissionPolicy::FallbackTo(rate) => {
                warn!(
                    error = %failure,
                    fallback_bps = rate.bps(),
                    "Commission unavailable, pricing with fallback rate"
                );
                Ok(rate)
            }
            CommissionPolicy::Strict => Err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use rihla_core::{Coupon, DiscountType};
    use rihla_db::{DbError, DbResult};
    use std::collections::HashMap;

    /// Canned store. `commission: Err(())` simulates a database outage.
    struct FakeStore {
        commission: Result<Option<Rate>, ()>,
        coupons: HashMap<String, Coupon>,
    }

    #[async_trait]
    impl PricingStore for FakeStore {
        async fn commission_rate(&self) -> DbResult<Option<Rate>> {
            self.commission
                .map_err(|_| DbError::ConnectionFailed("database is down".to_string()))
        }

        async fn coupon(&self, code: &str) -> DbResult<Option<Coupon>> {
            Ok(self.coupons.get(code).cloned())
        }
    }

    fn coupon(code: &str, discount_type: DiscountType, value: i64) -> Coupon {
        Coupon {
            code: code.to_string(),
            discount_type,
            value,
            max_usage: None,
            current_usage: 0,
            expires_at: None,
            is_active: true,
        }
    }

    fn engine_with(commission: Result<Option<Rate>, ()>, policy: CommissionPolicy) -> PricingEngine {
        let now = Utc::now();
        let mut coupons = HashMap::new();

        coupons.insert(
            "SAVE10".to_string(),
            Coupon {
                max_usage: Some(100),
                current_usage: 5,
                expires_at: Some(now + Duration::days(30)),
                ..coupon("SAVE10", DiscountType::Percentage, 1000)
            },
        );
        coupons.insert("BIG".to_string(), coupon("BIG", DiscountType::Fixed, 50_000));
        coupons.insert(
            "OLD".to_string(),
            Coupon {
                expires_at: Some(now - Duration::days(1)),
                ..coupon("OLD", DiscountType::Percentage, 500)
            },
        );
        coupons.insert(
            "FULL".to_string(),
            Coupon {
                max_usage: Some(3),
                current_usage: 3,
                ..coupon("FULL", DiscountType::Percentage, 500)
            },
        );
        coupons.insert(
            "OFF".to_string(),
            Coupon {
                is_active: false,
                ..coupon("OFF", DiscountType::Percentage, 500)
            },
        );

        PricingEngine::new(Arc::new(FakeStore { commission, coupons }), policy)
    }

    fn engine() -> PricingEngine {
        engine_with(Ok(Some(Rate::from_bps(1000))), CommissionPolicy::Strict)
    }

    #[tokio::test]
    async fn test_percentage_coupon_breakdown() {
        let b = engine()
            .compute_price(Money::from_cents(20_000), Some("SAVE10"))
            .await
            .unwrap();

        assert_eq!(b.original_price, Money::from_cents(20_000));
        assert_eq!(b.discount_amount, Money::from_cents(2_000));
        assert_eq!(b.final_price, Money::from_cents(18_000));
        assert_eq!(b.platform_fee, Money::from_cents(1_800));
        assert_eq!(b.provider_earnings, Money::from_cents(16_200));
        assert_eq!(b.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(b.commission_rate, Rate::from_bps(1000));
    }

    #[tokio::test]
    async fn test_code_is_case_and_whitespace_insensitive() {
        let b = engine()
            .compute_price(Money::from_cents(20_000), Some("  save10 "))
            .await
            .unwrap();
        assert_eq!(b.coupon_code.as_deref(), Some("SAVE10"));
    }

    #[tokio::test]
    async fn test_no_coupon() {
        for code in [None, Some(""), Some("   ")] {
            let b = engine()
                .compute_price(Money::from_cents(20_000), code)
                .await
                .unwrap();
            assert!(b.discount_amount.is_zero());
            assert_eq!(b.final_price, Money::from_cents(20_000));
            assert_eq!(b.platform_fee, Money::from_cents(2_000));
            assert!(b.coupon_code.is_none());
        }
    }

    #[tokio::test]
    async fn test_fixed_discount_clamped_to_base() {
        let b = engine()
            .compute_price(Money::from_cents(20_000), Some("BIG"))
            .await
            .unwrap();
        assert_eq!(b.discount_amount, Money::from_cents(20_000));
        assert!(b.final_price.is_zero());
        assert!(b.platform_fee.is_zero());
        assert!(b.provider_earnings.is_zero());
    }

    #[tokio::test]
    async fn test_coupon_rejections() {
        let base = Money::from_cents(20_000);
        let engine = engine();

        assert_eq!(
            engine.compute_price(base, Some("NOPE")).await.unwrap_err(),
            PricingError::InvalidCoupon("NOPE".to_string())
        );
        assert_eq!(
            engine.compute_price(base, Some("OFF")).await.unwrap_err(),
            PricingError::InvalidCoupon("OFF".to_string())
        );
        assert_eq!(
            engine.compute_price(base, Some("OLD")).await.unwrap_err(),
            PricingError::CouponExpired("OLD".to_string())
        );
        assert_eq!(
            engine.compute_price(base, Some("FULL")).await.unwrap_err(),
            PricingError::CouponExhausted("FULL".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_positive_base_rejected() {
        for cents in [0, -100] {
            let err = engine()
                .compute_price(Money::from_cents(cents), None)
                .await
                .unwrap_err();
            assert!(matches!(err, PricingError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_base_checked_before_commission() {
        let engine = engine_with(Ok(None), CommissionPolicy::Strict);
        let err = engine.compute_price(Money::zero(), None).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_commission_is_configuration_error() {
        let engine = engine_with(Ok(None), CommissionPolicy::Strict);
        let err = engine
            .compute_price(Money::from_cents(20_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_store_outage_is_store_error() {
        let engine = engine_with(Err(()), CommissionPolicy::Strict);
        let err = engine
            .compute_price(Money::from_cents(20_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::Store(_)));
    }

    #[tokio::test]
    async fn test_fallback_rate_used_when_commission_unavailable() {
        let policy = CommissionPolicy::FallbackTo(Rate::from_bps(1500));

        for commission in [Ok(None), Err(())] {
            let b = engine_with(commission, policy)
                .compute_price(Money::from_cents(10_000), None)
                .await
                .unwrap();
            assert_eq!(b.commission_rate, Rate::from_bps(1500));
            assert_eq!(b.platform_fee, Money::from_cents(1_500));
            assert_eq!(b.provider_earnings, Money::from_cents(8_500));
        }
    }

    #[tokio::test]
    async fn test_configured_rate_wins_over_fallback() {
        let engine = engine_with(
            Ok(Some(Rate::from_bps(1000))),
            CommissionPolicy::FallbackTo(Rate::from_bps(1500)),
        );
        let b = engine
            .compute_price(Money::from_cents(10_000), None)
            .await
            .unwrap();
        assert_eq!(b.commission_rate, Rate::from_bps(1000));
    }

    #[tokio::test]
    async fn test_expiry_evaluated_at_given_instant() {
        let engine = engine();
        let later = Utc::now() + Duration::days(60);
        let err = engine
            .compute_price_at(Money::from_cents(20_000), Some("SAVE10"), later)
            .await
            .unwrap_err();
        assert_eq!(err, PricingError::CouponExpired("SAVE10".to_string()));
    }
}
