//! # Notifications
//!
//! Best-effort messages sent after a booking is confirmed.
//!
//! Delivery never affects the booking: the lifecycle sends all notices
//! concurrently under one deadline and only logs failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rihla_core::Money;
use serde::Serialize;
use thiserror::Error;

/// A message for a customer or provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Sent to the customer with their new ticket.
    #[serde(rename_all = "camelCase")]
    TicketIssued {
        user_id: String,
        booking_id: String,
        ticket_code: String,
        service_title: String,
        amount_paid: Money,
        /// Base64 tax invoice QR, when one could be generated
        tax_qr: Option<String>,
    },

    /// Sent to the provider whose service was booked.
    #[serde(rename_all = "camelCase")]
    PaymentReceived {
        provider_id: String,
        booking_id: String,
        service_title: String,
        provider_earnings: Money,
    },
}

impl Notice {
    /// Id of the user or provider the notice is addressed to.
    pub fn recipient(&self) -> &str {
        match self {
            Notice::TicketIssued { user_id, .. } => user_id,
            Notice::PaymentReceived { provider_id, .. } => provider_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{0}")]
    Transport(String),

    #[error("notification relay returned status {0}")]
    Rejected(u16),
}

/// A delivery channel (email relay, SMS gateway, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError>;

    fn channel(&self) -> &'static str;
}

/// Posts notices as JSON to a relay endpoint.
pub struct HttpNotifier {
    channel: &'static str,
    url: String,
    client: Client,
}

impl HttpNotifier {
    pub fn new(
        channel: &'static str,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|_| NotifyError::Transport(format!("{} client failed to build", channel)))?;

        Ok(Self {
            channel,
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .await
            .map_err(|e| sanitize_reqwest_error(self.channel, e))?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(NotifyError::Rejected(response.status().as_u16()))
    }

    fn channel(&self) -> &'static str {
        self.channel
    }
}

// Relay URLs may carry credentials, so they never reach the logs.
fn sanitize_reqwest_error(channel: &str, error: reqwest::Error) -> NotifyError {
    if error.is_timeout() {
        return NotifyError::Transport(format!("{} relay request timed out", channel));
    }
    if error.is_connect() {
        return NotifyError::Transport(format!("{} relay connection failed", channel));
    }
    NotifyError::Transport(format!("{} relay request failed", channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket_notice() -> Notice {
        Notice::TicketIssued {
            user_id: "user-001".to_string(),
            booking_id: "b-1".to_string(),
            ticket_code: "TKT-ABC".to_string(),
            service_title: "Siwa Oasis Day Trip".to_string(),
            amount_paid: Money::from_cents(18_000),
            tax_qr: Some("AQVSaWhsYQ==".to_string()),
        }
    }

    #[test]
    fn test_notice_json_shape() {
        let value = serde_json::to_value(ticket_notice()).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "ticket_issued",
                "userId": "user-001",
                "bookingId": "b-1",
                "ticketCode": "TKT-ABC",
                "serviceTitle": "Siwa Oasis Day Trip",
                "amountPaid": 18000,
                "taxQr": "AQVSaWhsYQ=="
            })
        );
    }

    #[test]
    fn test_recipient() {
        assert_eq!(ticket_notice().recipient(), "user-001");

        let notice = Notice::PaymentReceived {
            provider_id: "prov-sahara".to_string(),
            booking_id: "b-1".to_string(),
            service_title: "Siwa Oasis Day Trip".to_string(),
            provider_earnings: Money::from_cents(16_200),
        };
        assert_eq!(notice.recipient(), "prov-sahara");
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_an_error() {
        let notifier =
            HttpNotifier::new("email", "http://127.0.0.1:1/notify", Duration::from_secs(2)).unwrap();
        assert_eq!(notifier.channel(), "email");

        let err = notifier.send(&ticket_notice()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
        assert!(!err.to_string().contains("127.0.0.1"));
    }
}
