//! # rihla-api: Booking Core HTTP Server
//!
//! Price previews, payment webhooks and ticket redemption for the Rihla
//! tourism marketplace.
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`error`] - HTTP error mapping
//! - [`services`] - Pricing, booking lifecycle, redemption, notifications
//! - [`http`] - axum router and handlers
//!
//! ## Endpoints
//! ```text
//! GET  /health                  → "OK" / 503
//! POST /api/pricing/preview     → PriceBreakdown
//! POST /api/webhooks/payment    → PaymentOutcome      (?hmac=<hex>)
//! POST /api/tickets/redeem      → RedeemResponse
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod services;

use std::sync::Arc;

use rihla_db::Database;

use crate::config::ApiConfig;
use crate::services::lifecycle::{BookingLifecycle, TaxProfile};
use crate::services::notify::{HttpNotifier, Notifier, NotifyError};
use crate::services::pricing::PricingEngine;
use crate::services::redemption::TicketRedemption;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub db: Database,
    pub pricing: PricingEngine,
    pub lifecycle: BookingLifecycle,
    pub redemption: TicketRedemption,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        let store = Arc::new(db.clone());

        let tax = TaxProfile {
            seller_name: config.seller_name.clone(),
            vat_number: config.seller_vat_number.clone(),
            vat_rate: config.vat_rate,
        };

        let lifecycle = notifiers.into_iter().fold(
            BookingLifecycle::new(store.clone(), config.payment_hmac_secret.clone(), tax)
                .hook_timeout(config.notify_timeout),
            BookingLifecycle::with_notifier,
        );

        AppState {
            pricing: PricingEngine::new(store.clone(), config.commission_policy()),
            redemption: TicketRedemption::new(store),
            lifecycle,
            db,
        }
    }
}

/// Builds one notifier per configured relay URL.
pub fn notifiers_from_config(config: &ApiConfig) -> Result<Vec<Arc<dyn Notifier>>, NotifyError> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if let Some(url) = &config.notify_email_url {
        notifiers.push(Arc::new(HttpNotifier::new("email", url, config.notify_timeout)?));
    }
    if let Some(url) = &config.notify_sms_url {
        notifiers.push(Arc::new(HttpNotifier::new("sms", url, config.notify_timeout)?));
    }

    Ok(notifiers)
}
