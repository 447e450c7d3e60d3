//! # Service Layer
//!
//! Business operations behind the HTTP handlers.
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────────┐     ┌───────────────────┐
//! │  PricingEngine   │     │  BookingLifecycle  │     │ TicketRedemption  │
//! │  (preview)       │     │  (payment webhook) │     │ (provider scan)   │
//! └────────┬─────────┘     └─────────┬──────────┘     └─────────┬─────────┘
//!          │                         │                          │
//!          ▼                         ▼                          ▼
//!    dyn PricingStore          dyn BookingStore  ◄──────────────┘
//!          │                         │
//!          └──────────┬──────────────┘
//!                     ▼
//!              rihla_db::Database
//! ```
//!
//! Services depend on the store traits rather than on `Database` directly,
//! so unit tests can inject failing or canned stores.

pub mod lifecycle;
pub mod notify;
pub mod pricing;
pub mod redemption;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rihla_core::{Coupon, Rate, Service, TicketCode};
use rihla_db::{ConfirmOutcome, Database, DbResult, TicketLookup};

/// Read access to the data a price preview needs.
#[async_trait]
pub trait PricingStore: Send + Sync {
    /// Current marketplace commission, `None` if it was never configured.
    async fn commission_rate(&self) -> DbResult<Option<Rate>>;

    /// Coupon by its canonical (upper-case) code.
    async fn coupon(&self, code: &str) -> DbResult<Option<Coupon>>;
}

/// Booking state transitions used by the payment and redemption flows.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn confirm_payment(
        &self,
        booking_id: &str,
        ticket: &TicketCode,
        payment_reference: &str,
        now: DateTime<Utc>,
    ) -> DbResult<ConfirmOutcome>;

    async fn find_by_ticket(&self, ticket_code: &str) -> DbResult<Option<TicketLookup>>;

    /// Marks the ticket used. `false` if it was not redeemable.
    async fn redeem(&self, ticket_code: &str, now: DateTime<Utc>) -> DbResult<bool>;

    async fn service(&self, service_id: &str) -> DbResult<Option<Service>>;
}

#[async_trait]
impl PricingStore for Database {
    async fn commission_rate(&self) -> DbResult<Option<Rate>> {
        Ok(self.commission().get().await?.map(|setting| setting.rate))
    }

    async fn coupon(&self, code: &str) -> DbResult<Option<Coupon>> {
        self.coupons().get_by_code(code).await
    }
}

#[async_trait]
impl BookingStore for Database {
    async fn confirm_payment(
        &self,
        booking_id: &str,
        ticket: &TicketCode,
        payment_reference: &str,
        now: DateTime<Utc>,
    ) -> DbResult<ConfirmOutcome> {
        self.bookings()
            .confirm_payment(booking_id, ticket, payment_reference, now)
            .await
    }

    async fn find_by_ticket(&self, ticket_code: &str) -> DbResult<Option<TicketLookup>> {
        self.bookings().find_by_ticket(ticket_code).await
    }

    async fn redeem(&self, ticket_code: &str, now: DateTime<Utc>) -> DbResult<bool> {
        self.bookings().redeem(ticket_code, now).await
    }

    async fn service(&self, service_id: &str) -> DbResult<Option<Service>> {
        self.services().get_by_id(service_id).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for service and router tests.

    use chrono::{Duration, NaiveDate, Utc};
    use rihla_core::pricing::compute_breakdown;
    use rihla_core::{Booking, Coupon, DiscountType, Money, Rate, Service};
    use rihla_db::{Database, DbConfig, NewBooking};
    use serde_json::{json, Value};

    pub const SECRET: &str = "test-hmac-secret";
    pub const PROVIDER: &str = "prov-nile";

    /// In-memory database with 10% commission, one service and SAVE10.
    pub async fn seeded_db() -> (Database, Service) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.commission().set_rate(Rate::from_bps(1000)).await.unwrap();

        let service = Service {
            id: "svc-felucca".to_string(),
            provider_id: PROVIDER.to_string(),
            title: "Nile Felucca Sunset Ride".to_string(),
        };
        db.services().insert(&service).await.unwrap();

        db.coupons()
            .insert(&Coupon {
                code: "SAVE10".to_string(),
                discount_type: DiscountType::Percentage,
                value: 1000,
                max_usage: Some(100),
                current_usage: 0,
                expires_at: Some(Utc::now() + Duration::days(30)),
                is_active: true,
            })
            .await
            .unwrap();

        (db, service)
    }

    /// Pending booking for 200.00 with SAVE10 applied (final 180.00).
    pub async fn pending_booking(db: &Database, service: &Service) -> Booking {
        let coupon = db.coupons().get_by_code("SAVE10").await.unwrap();
        let price = compute_breakdown(
            Money::from_cents(20_000),
            coupon.as_ref(),
            Rate::from_bps(1000),
            Utc::now(),
        )
        .unwrap();

        db.bookings()
            .create_pending(&NewBooking {
                user_id: "user-001".to_string(),
                service_id: service.id.clone(),
                booking_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                check_in: None,
                check_out: None,
                guests_count: 2,
                price,
            })
            .await
            .unwrap()
    }

    /// Transaction callback object for `booking_id`.
    pub fn transaction(booking_id: &str, amount_cents: i64) -> Value {
        json!({
            "id": 192036465,
            "pending": false,
            "amount_cents": amount_cents,
            "success": true,
            "is_auth": false,
            "is_capture": false,
            "is_standalone_payment": true,
            "is_voided": false,
            "is_refunded": false,
            "is_3d_secure": true,
            "integration_id": 4097558,
            "has_parent_transaction": false,
            "order": {
                "id": 217503754,
                "merchant_order_id": format!("rihla-{}", booking_id)
            },
            "created_at": "2026-10-19T12:00:00.000000",
            "currency": "EGP",
            "source_data": {
                "pan": "2346",
                "type": "card",
                "sub_type": "MasterCard"
            },
            "error_occured": false,
            "owner": 302852
        })
    }

    /// Serialized callback body plus its valid signature.
    pub fn signed(obj: Value) -> (Vec<u8>, String) {
        let signature = rihla_core::webhook::sign(&obj, SECRET).unwrap();
        let body = serde_json::to_vec(&json!({ "type": "TRANSACTION", "obj": obj })).unwrap();
        (body, signature)
    }
}
