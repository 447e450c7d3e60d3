//! # Booking Lifecycle
//!
//! Turns payment processor callbacks into confirmed bookings.
//!
//! ## Webhook Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/webhooks/payment?hmac=...                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  verify_payload (HMAC-SHA512) ──── mismatch ──► Unauthorized            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  success && !pending ? ──── no ──► NotSuccessful (no change)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  confirm_payment (one transaction)                                     │
//! │    pending/unpaid → confirmed/paid, ticket minted, coupon usage +1     │
//! │       │                                                                 │
//! │       ├── already paid ──► AlreadyProcessed (duplicate delivery)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax QR + notices (concurrent, one deadline, never fail the webhook)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rihla_core::tax_qr::generate_tax_qr;
use rihla_core::validation::booking_id_from_order_ref;
use rihla_core::webhook::{verify_payload, PaymentEvent};
use rihla_core::{Booking, BookingStatus, Rate, SignatureError, TicketCode};
use rihla_db::{ConfirmOutcome, CouponUsage};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::notify::{Notice, Notifier};
use super::BookingStore;

/// Default upper bound for delivering all notices of one confirmation.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a processed (authentic) payment callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// This delivery confirmed the booking.
    #[serde(rename_all = "camelCase")]
    Confirmed {
        booking_id: String,
        ticket_code: String,
        tax_qr: Option<String>,
    },

    /// The booking was already paid. Nothing changed.
    #[serde(rename_all = "camelCase")]
    AlreadyProcessed { booking_id: String },

    /// Failed or still pending at the processor. Nothing changed.
    #[serde(rename_all = "camelCase")]
    NotSuccessful { transaction_id: String },
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Webhook signature rejected: {0}")]
    Unauthorized(SignatureError),

    #[error("Malformed payment event: {0}")]
    MalformedEvent(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Booking {booking_id} cannot be confirmed from status {status:?}")]
    InvalidState {
        booking_id: String,
        status: BookingStatus,
    },

    #[error("Booking store failed: {0}")]
    Persistence(String),
}

/// Seller details printed into the tax QR.
#[derive(Debug, Clone)]
pub struct TaxProfile {
    pub seller_name: String,
    pub vat_number: String,
    pub vat_rate: Rate,
}

/// Handles payment callbacks for bookings.
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    secret: String,
    tax: TaxProfile,
    notifiers: Vec<Arc<dyn Notifier>>,
    hook_timeout: Duration,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn BookingStore>, secret: impl Into<String>, tax: TaxProfile) -> Self {
        Self {
            store,
            secret: secret.into(),
            tax,
            notifiers: Vec::new(),
            hook_timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn hook_timeout(mut self, hook_timeout: Duration) -> Self {
        self.hook_timeout = hook_timeout;
        self
    }

    /// Verifies and processes a raw callback body.
    ///
    /// The body must be the exact bytes received; the signature covers
    /// values as they appear in it.
    pub async fn handle_webhook(
        &self,
        raw_payload: &[u8],
        signature: Option<&str>,
    ) -> Result<PaymentOutcome, LifecycleError> {
        let Some(signature) = signature.filter(|s| !s.trim().is_empty()) else {
            warn!(security_event = true, "Payment webhook without signature");
            return Err(LifecycleError::Unauthorized(SignatureError::MissingField("hmac")));
        };

        let event = match verify_payload(raw_payload, signature, &self.secret) {
            Ok(event) => event,
            Err(SignatureError::MalformedPayload(reason)) => {
                warn!(security_event = true, %reason, "Unparseable payment webhook");
                return Err(LifecycleError::MalformedEvent(reason));
            }
            Err(e) => {
                warn!(security_event = true, error = %e, "Payment webhook signature rejected");
                return Err(LifecycleError::Unauthorized(e));
            }
        };

        if !event.is_successful() {
            info!(
                transaction_id = %event.transaction_id,
                success = event.success,
                pending = event.pending,
                "Payment not successful, booking left unchanged"
            );
            return Ok(PaymentOutcome::NotSuccessful {
                transaction_id: event.transaction_id,
            });
        }

        self.on_payment_confirmed(&event).await
    }

    /// Confirms the booking a verified, successful payment refers to.
    ///
    /// Safe to call more than once for the same event: only the first call
    /// mints a ticket and counts the coupon.
    pub async fn on_payment_confirmed(
        &self,
        event: &PaymentEvent,
    ) -> Result<PaymentOutcome, LifecycleError> {
        let booking_id = booking_id_from_order_ref(&event.merchant_order_id)
            .map_err(|e| LifecycleError::MalformedEvent(e.to_string()))?;

        let now = Utc::now();
        let ticket = TicketCode::generate();

        let outcome = self
            .store
            .confirm_payment(booking_id, &ticket, &event.transaction_id, now)
            .await
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;

        let (booking, coupon_usage) = match outcome {
            ConfirmOutcome::Confirmed {
                booking,
                coupon_usage,
            } => (booking, coupon_usage),
            ConfirmOutcome::AlreadyPaid(booking) => {
                info!(
                    booking_id = %booking.id,
                    transaction_id = %event.transaction_id,
                    "Duplicate payment delivery ignored"
                );
                return Ok(PaymentOutcome::AlreadyProcessed {
                    booking_id: booking.id,
                });
            }
            ConfirmOutcome::NotFound => {
                warn!(booking_id, "Payment for unknown booking");
                return Err(LifecycleError::BookingNotFound(booking_id.to_string()));
            }
            ConfirmOutcome::InvalidState(booking) => {
                warn!(
                    booking_id = %booking.id,
                    status = ?booking.status,
                    "Payment for booking that is not pending"
                );
                return Err(LifecycleError::InvalidState {
                    booking_id: booking.id,
                    status: booking.status,
                });
            }
        };

        info!(
            booking_id = %booking.id,
            transaction_id = %event.transaction_id,
            final_price = %booking.price.final_price,
            coupon_usage = ?coupon_usage,
            "Booking confirmed"
        );

        if coupon_usage == CouponUsage::LimitReached {
            warn!(
                booking_id = %booking.id,
                coupon = ?booking.price.coupon_code,
                "Coupon limit was reached before this payment; usage not counted"
            );
        }

        if event.amount_cents != booking.price.final_price.cents() {
            warn!(
                security_event = true,
                booking_id = %booking.id,
                paid_cents = event.amount_cents,
                expected_cents = booking.price.final_price.cents(),
                "Paid amount differs from booking price"
            );
        }

        let tax_qr = self.tax_qr(&booking, booking.confirmed_at.unwrap_or(now));
        self.notify(&booking, ticket.as_str(), tax_qr.clone()).await;

        Ok(PaymentOutcome::Confirmed {
            booking_id: booking.id,
            ticket_code: ticket.into_inner(),
            tax_qr,
        })
    }

    fn tax_qr(&self, booking: &Booking, confirmed_at: DateTime<Utc>) -> Option<String> {
        let total = booking.price.final_price;
        let vat = total.included_tax(self.tax.vat_rate);

        match generate_tax_qr(
            &self.tax.seller_name,
            &self.tax.vat_number,
            &confirmed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            &total.to_string(),
            &vat.to_string(),
        ) {
            Ok(qr) => Some(qr),
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "Tax QR not generated");
                None
            }
        }
    }

    /// Sends every notice on every channel concurrently. Whatever is still
    /// in flight when `hook_timeout` runs out is aborted.
    async fn notify(&self, booking: &Booking, ticket_code: &str, tax_qr: Option<String>) {
        if self.notifiers.is_empty() {
            return;
        }
        let deadline = Instant::now() + self.hook_timeout;

        let service = match timeout_at(deadline, self.store.service(&booking.service_id)).await {
            Ok(Ok(service)) => service,
            Ok(Err(e)) => {
                warn!(booking_id = %booking.id, error = %e, "Service lookup for notices failed");
                None
            }
            Err(_) => {
                warn!(booking_id = %booking.id, "Service lookup for notices timed out");
                None
            }
        };
        let service_title = service
            .as_ref()
            .map(|s| s.title.clone())
            .unwrap_or_else(|| booking.service_id.clone());

        let mut notices = vec![Notice::TicketIssued {
            user_id: booking.user_id.clone(),
            booking_id: booking.id.clone(),
            ticket_code: ticket_code.to_string(),
            service_title: service_title.clone(),
            amount_paid: booking.price.final_price,
            tax_qr,
        }];
        if let Some(service) = &service {
            notices.push(Notice::PaymentReceived {
                provider_id: service.provider_id.clone(),
                booking_id: booking.id.clone(),
                service_title,
                provider_earnings: booking.price.provider_earnings,
            });
        }

        let mut sends = JoinSet::new();
        for notifier in &self.notifiers {
            for notice in &notices {
                let notifier = Arc::clone(notifier);
                let notice = notice.clone();
                sends.spawn(async move {
                    let result = notifier.send(&notice).await;
                    (notifier.channel(), notice, result)
                });
            }
        }

        loop {
            match timeout_at(deadline, sends.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((channel, notice, Ok(()))))) => {
                    debug!(channel, recipient = notice.recipient(), "Notice sent")
                }
                Ok(Some(Ok((channel, notice, Err(e))))) => warn!(
                    channel,
                    recipient = notice.recipient(),
                    error = %e,
                    "Notice failed"
                ),
                Ok(Some(Err(e))) => warn!(booking_id = %booking.id, error = %e, "Notice task failed"),
                Err(_) => {
                    warn!(
                        booking_id = %booking.id,
                        unfinished = sends.len(),
                        "Notices timed out"
                    );
                    sends.abort_all();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notify::NotifyError;
    use crate::services::test_support::{pending_booking, seeded_db, signed, transaction, SECRET};
    use async_trait::async_trait;
    use rihla_core::tax_qr::decode_tax_qr;
    use rihla_core::PaymentStatus;
    use rihla_db::Database;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }

        fn channel(&self) -> &'static str {
            "recording"
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _notice: &Notice) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected(502))
        }

        fn channel(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowNotifier;

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn send(&self, _notice: &Notice) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }

        fn channel(&self) -> &'static str {
            "slow"
        }
    }

    fn tax() -> TaxProfile {
        TaxProfile {
            seller_name: "Rihla".to_string(),
            vat_number: "300000000000003".to_string(),
            vat_rate: Rate::from_bps(1500),
        }
    }

    fn lifecycle(db: &Database) -> BookingLifecycle {
        BookingLifecycle::new(Arc::new(db.clone()), SECRET, tax())
    }

    #[tokio::test]
    async fn test_successful_payment_confirms_booking() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let recorder = Arc::new(RecordingNotifier::default());
        let lifecycle = lifecycle(&db).with_notifier(recorder.clone());

        let (body, signature) = signed(transaction(&booking.id, 18_000));
        let outcome = lifecycle.handle_webhook(&body, Some(&signature)).await.unwrap();

        let PaymentOutcome::Confirmed {
            booking_id,
            ticket_code,
            tax_qr,
        } = outcome
        else {
            panic!("expected Confirmed");
        };
        assert_eq!(booking_id, booking.id);
        assert!(ticket_code.starts_with("TKT-"));

        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.ticket_code.as_deref(), Some(ticket_code.as_str()));
        assert_eq!(stored.payment_reference.as_deref(), Some("192036465"));

        let coupon = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(coupon.current_usage, 1);

        let invoice = decode_tax_qr(&tax_qr.unwrap()).unwrap();
        assert_eq!(invoice.seller_name, "Rihla");
        assert_eq!(invoice.vat_number, "300000000000003");
        assert_eq!(invoice.total, "180.00");
        assert_eq!(invoice.vat_amount, "23.48");
        assert!(invoice.timestamp.ends_with('Z'));

        let mut sent = recorder.sent.lock().unwrap().clone();
        sent.sort_by(|a, b| a.recipient().cmp(b.recipient()));
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipient(), "prov-nile");
        assert_eq!(sent[1].recipient(), "user-001");

        // The customer notice carries the same invoice
        let Notice::TicketIssued {
            ticket_code: noticed_code,
            tax_qr: noticed_qr,
            ..
        } = &sent[1]
        else {
            panic!("expected TicketIssued");
        };
        assert_eq!(noticed_code, &ticket_code);
        let noticed = decode_tax_qr(noticed_qr.as_deref().unwrap()).unwrap();
        assert_eq!(noticed, invoice);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let recorder = Arc::new(RecordingNotifier::default());
        let lifecycle = lifecycle(&db).with_notifier(recorder.clone());

        let (body, signature) = signed(transaction(&booking.id, 18_000));
        let first = lifecycle.handle_webhook(&body, Some(&signature)).await.unwrap();
        let ticket = match first {
            PaymentOutcome::Confirmed { ticket_code, .. } => ticket_code,
            other => panic!("expected Confirmed, got {:?}", other),
        };

        let second = lifecycle.handle_webhook(&body, Some(&signature)).await.unwrap();
        assert_eq!(
            second,
            PaymentOutcome::AlreadyProcessed {
                booking_id: booking.id.clone()
            }
        );

        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.ticket_code.as_deref(), Some(ticket.as_str()));
        let coupon = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(coupon.current_usage, 1);
        // Notices only go out for the confirming delivery
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unsuccessful_payment_changes_nothing() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;

        for (field, value) in [("success", false), ("pending", true)] {
            let mut obj = transaction(&booking.id, 18_000);
            obj[field] = json!(value);
            let (body, signature) = signed(obj);

            let outcome = lifecycle(&db)
                .handle_webhook(&body, Some(&signature))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                PaymentOutcome::NotSuccessful {
                    transaction_id: "192036465".to_string()
                }
            );
        }

        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert!(stored.ticket_code.is_none());
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let lifecycle = lifecycle(&db);
        let (body, _) = signed(transaction(&booking.id, 18_000));

        let wrong = rihla_core::webhook::sign(&transaction(&booking.id, 18_000), "other").unwrap();
        for signature in [Some(wrong.as_str()), Some("zz-not-hex"), Some(""), None] {
            let err = lifecycle.handle_webhook(&body, signature).await.unwrap_err();
            assert!(matches!(err, LifecycleError::Unauthorized(_)), "{:?}", signature);
        }

        let stored = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (db, _) = seeded_db().await;
        let err = lifecycle(&db)
            .handle_webhook(b"not json", Some("abcd"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn test_bad_order_reference() {
        let (db, _) = seeded_db().await;
        let mut obj = transaction("unused", 18_000);
        obj["order"]["merchant_order_id"] = json!("nodash");
        let (body, signature) = signed(obj);

        let err = lifecycle(&db)
            .handle_webhook(&body, Some(&signature))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let (db, _) = seeded_db().await;
        let (body, signature) = signed(transaction("no-such-booking", 18_000));

        let err = lifecycle(&db)
            .handle_webhook(&body, Some(&signature))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::BookingNotFound(id) if id == "no-such-booking"));
    }

    #[tokio::test]
    async fn test_cancelled_booking_not_confirmed() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        assert!(db.bookings().cancel(&booking.id).await.unwrap());

        let (body, signature) = signed(transaction(&booking.id, 18_000));
        let err = lifecycle(&db)
            .handle_webhook(&body, Some(&signature))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidState {
                status: BookingStatus::Cancelled,
                ..
            }
        ));

        let coupon = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(coupon.current_usage, 0);
    }

    #[tokio::test]
    async fn test_amount_mismatch_still_confirms() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let (body, signature) = signed(transaction(&booking.id, 100));

        let outcome = lifecycle(&db)
            .handle_webhook(&body, Some(&signature))
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::Confirmed { .. }));
    }

    #[tokio::test]
    async fn test_notifier_failures_do_not_fail_confirmation() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let recorder = Arc::new(RecordingNotifier::default());
        let lifecycle = lifecycle(&db)
            .with_notifier(Arc::new(FailingNotifier))
            .with_notifier(Arc::new(SlowNotifier))
            .with_notifier(recorder.clone())
            .hook_timeout(Duration::from_millis(50));

        let (body, signature) = signed(transaction(&booking.id, 18_000));
        let outcome = lifecycle.handle_webhook(&body, Some(&signature)).await.unwrap();

        assert!(matches!(outcome, PaymentOutcome::Confirmed { .. }));
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_channels_share_one_deadline() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let recorder = Arc::new(RecordingNotifier::default());
        let mut lifecycle = lifecycle(&db).hook_timeout(Duration::from_millis(300));
        for _ in 0..4 {
            lifecycle = lifecycle.with_notifier(Arc::new(SlowNotifier));
        }
        let lifecycle = lifecycle.with_notifier(recorder.clone());

        let (body, signature) = signed(transaction(&booking.id, 18_000));
        let started = std::time::Instant::now();
        let outcome = lifecycle.handle_webhook(&body, Some(&signature)).await.unwrap();
        let elapsed = started.elapsed();

        assert!(matches!(outcome, PaymentOutcome::Confirmed { .. }));
        // Eight slow sends one after another would need 2.4s
        assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_outcome_json_shape() {
        let value = serde_json::to_value(PaymentOutcome::AlreadyProcessed {
            booking_id: "b-1".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({ "status": "already_processed", "bookingId": "b-1" }));
    }
}
