//! # rihla-core: Pure Business Logic for Rihla Bookings
//!
//! This crate is the **heart** of the Rihla booking backend. It contains the
//! money math, coupon rules, webhook signature checks, ticket minting and tax
//! QR encoding as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rihla Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP API (apps/api, axum)                       │   │
//! │  │   /pricing/preview   /webhooks/payment   /tickets/redeem        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rihla-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │ pricing │ │ webhook │ │ ticket  │ │ tax_qr  │  │   │
//! │  │   │  Money  │ │Breakdown│ │  HMAC   │ │ minting │ │   TLV   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    rihla-db (Database Layer)                    │   │
//! │  │        SQLite, atomic conditional updates, repositories         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, Booking, PriceBreakdown, Rate, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Coupon validation and commission split
//! - [`webhook`] - Payment processor signature verification
//! - [`ticket`] - Ticket credential minting and normalization
//! - [`tax_qr`] - Tag-length-value tax invoice QR payloads
//! - [`error`] - Domain error types
//! - [`validation`] - Input normalization and business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use rihla_core::{pricing::compute_breakdown, Money, Rate};
//!
//! let breakdown = compute_breakdown(
//!     Money::from_cents(20000),
//!     None,
//!     Rate::from_bps(1000),
//!     Utc::now(),
//! )
//! .unwrap();
//!
//! assert_eq!(breakdown.final_price.cents(), 20000);
//! assert_eq!(breakdown.platform_fee.cents(), 2000);
//! assert_eq!(breakdown.provider_earnings.cents(), 18000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod tax_qr;
pub mod ticket;
pub mod types;
pub mod validation;
pub mod webhook;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{PricingError, RedemptionError, SignatureError, TaxQrError, ValidationError};
pub use money::Money;
pub use ticket::TicketCode;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Commission rate the marketplace has historically charged when the
/// commission setting could not be read.
///
/// Only applied when the caller opts into a fallback policy; pricing itself
/// never substitutes it silently.
pub const REFERENCE_COMMISSION_RATE: Rate = Rate::from_bps(1000);

/// Basis points in 100%.
pub const BPS_SCALE: u32 = 10_000;
