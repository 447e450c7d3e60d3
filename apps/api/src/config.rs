//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Only the webhook secret is mandatory.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use rihla_core::validation::validate_rate_bps;
use rihla_core::Rate;

use crate::services::pricing::CommissionPolicy;

/// API configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Shared secret for payment webhook HMACs
    pub payment_hmac_secret: String,

    /// Rate to price with when the commission setting is unavailable.
    /// `None` means pricing fails instead.
    pub commission_fallback: Option<Rate>,

    /// Seller name printed in the tax QR
    pub seller_name: String,

    /// Seller VAT registration number printed in the tax QR
    pub seller_vat_number: String,

    /// VAT rate included in booking totals
    pub vat_rate: Rate,

    /// Email relay endpoint (optional)
    pub notify_email_url: Option<String>,

    /// SMS relay endpoint (optional)
    pub notify_sms_url: Option<String>,

    /// Upper bound for delivering the notices of one confirmation
    pub notify_timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            bind_addr: get_or("BIND_ADDR", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?,

            port: get_or("PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: PathBuf::from(get_or("DATABASE_PATH", "./rihla.db")),

            db_max_connections: get_or("DB_MAX_CONNECTIONS", "5")
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            payment_hmac_secret: get("PAYMENT_HMAC_SECRET")
                .ok_or_else(|| ConfigError::MissingRequired("PAYMENT_HMAC_SECRET".to_string()))?,

            commission_fallback: get("COMMISSION_FALLBACK_BPS")
                .map(|v| parse_rate("COMMISSION_FALLBACK_BPS", &v))
                .transpose()?,

            seller_name: get_or("SELLER_NAME", "Rihla"),

            seller_vat_number: get("SELLER_VAT_NUMBER").unwrap_or_default(),

            vat_rate: parse_rate("VAT_RATE_BPS", &get_or("VAT_RATE_BPS", "1500"))?,

            notify_email_url: get("NOTIFY_EMAIL_URL"),

            notify_sms_url: get("NOTIFY_SMS_URL"),

            notify_timeout: get_or("NOTIFY_TIMEOUT_SECS", "10")
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue("NOTIFY_TIMEOUT_SECS".to_string()))?,
        };

        Ok(config)
    }

    /// Address the HTTP server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Commission policy derived from `COMMISSION_FALLBACK_BPS`.
    pub fn commission_policy(&self) -> CommissionPolicy {
        match self.commission_fallback {
            Some(rate) => CommissionPolicy::FallbackTo(rate),
            None => CommissionPolicy::Strict,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("payment_hmac_secret", &"<redacted>")
            .field("commission_fallback", &self.commission_fallback)
            .field("seller_name", &self.seller_name)
            .field("seller_vat_number", &self.seller_vat_number)
            .field("vat_rate", &self.vat_rate)
            .field("notify_email_url", &redact_url(&self.notify_email_url))
            .field("notify_sms_url", &redact_url(&self.notify_sms_url))
            .field("notify_timeout", &self.notify_timeout)
            .finish()
    }
}

// Relay URLs may embed tokens
fn redact_url(url: &Option<String>) -> Option<&'static str> {
    url.as_ref().map(|_| "<redacted>")
}

fn parse_rate(key: &str, value: &str) -> Result<Rate, ConfigError> {
    let bps: u32 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
    validate_rate_bps(key, bps).map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
    Ok(Rate::from_bps(bps))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
