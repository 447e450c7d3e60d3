//! # Ticket Redemption
//!
//! A provider scans a customer's ticket at the venue. A ticket can be used
//! once, and only by the provider running the booked service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rihla_core::error::RedemptionResult;
use rihla_core::{BookingStatus, RedemptionError, TicketCode};
use serde::Serialize;
use tracing::{info, warn};

use super::BookingStore;

/// A successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redeemed {
    pub booking_id: String,
    pub service_title: String,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TicketRedemption {
    store: Arc<dyn BookingStore>,
}

impl TicketRedemption {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Redeems `ticket_code` on behalf of `provider_id`.
    ///
    /// Checks run in a fixed order: unknown ticket, wrong provider, already
    /// used, not confirmed. Only the final conditional update mutates state,
    /// so concurrent scans of one ticket produce exactly one success.
    pub async fn redeem_ticket(
        &self,
        ticket_code: &str,
        provider_id: &str,
    ) -> RedemptionResult<Redeemed> {
        let code = TicketCode::from_scan(ticket_code);

        let lookup = self
            .store
            .find_by_ticket(code.as_str())
            .await
            .map_err(|e| RedemptionError::Store(e.to_string()))?
            .ok_or(RedemptionError::InvalidTicket)?;

        let booking = lookup.booking;

        if lookup.service.provider_id != provider_id {
            warn!(
                security_event = true,
                booking_id = %booking.id,
                provider_id,
                "Ticket scanned by a provider that does not own the service"
            );
            return Err(RedemptionError::WrongProvider);
        }

        if booking.is_ticket_used {
            return Err(RedemptionError::AlreadyUsed);
        }

        if booking.status != BookingStatus::Confirmed {
            return Err(RedemptionError::InvalidTicket);
        }

        let now = Utc::now();
        let won = self
            .store
            .redeem(code.as_str(), now)
            .await
            .map_err(|e| RedemptionError::Store(e.to_string()))?;

        // Lost the race to a concurrent scan
        if !won {
            return Err(RedemptionError::AlreadyUsed);
        }

        info!(
            booking_id = %booking.id,
            provider_id,
            service = %lookup.service.title,
            "Ticket redeemed"
        );

        Ok(Redeemed {
            booking_id: booking.id,
            service_title: lookup.service.title,
            redeemed_at: now,
        })
    }
}
