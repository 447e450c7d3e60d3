//! # Domain Types
//!
//! Core domain types used throughout Rihla.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Coupon      │   │ PriceBreakdown  │   │     Booking     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (unique)  │   │  original_price │   │  id (UUID)      │       │
//! │  │  discount_type  │──►│  discount       │──►│  status         │       │
//! │  │  value          │   │  final_price    │   │  payment_status │       │
//! │  │  usage / limit  │   │  fee / earnings │   │  ticket_code    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │  BookingStatus  │   │  PaymentStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Unpaid         │       │
//! │  │  1000 = 10%     │   │  Confirmed      │   │  Paid           │       │
//! │  └─────────────────┘   │  Completed      │   └─────────────────┘       │
//! │                        │  Cancelled      │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::BPS_SCALE;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. 1000 bps = 10% commission,
/// 1500 bps = 15% VAT. Integer bps keep every percentage exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The share left over after this rate is taken: `100% - self`.
    ///
    /// Saturates at zero for rates above 100%.
    #[inline]
    pub const fn complement(&self) -> Self {
        Rate(BPS_SCALE.saturating_sub(self.0))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is basis points of the base price.
    Percentage,
    /// `value` is a flat amount in minor units.
    Fixed,
}

/// A discount code with usage limits and optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Canonical (normalized) code, unique.
    pub code: String,
    pub discount_type: DiscountType,
    /// Basis points for [`DiscountType::Percentage`], minor units for
    /// [`DiscountType::Fixed`].
    pub value: i64,
    /// `None` means unbounded.
    pub max_usage: Option<i64>,
    pub current_usage: i64,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Coupon {
    /// True once `expires_at` lies strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// True when a bounded coupon has no redemptions left.
    pub fn is_exhausted(&self) -> bool {
        self.max_usage
            .is_some_and(|max_usage| self.current_usage >= max_usage)
    }

    /// The discount this coupon would give on `base`, before clamping.
    pub fn raw_discount(&self, base: Money) -> Money {
        match self.discount_type {
            DiscountType::Percentage => {
                let bps = self.value.clamp(0, u32::MAX as i64) as u32;
                base.percentage(Rate::from_bps(bps))
            }
            DiscountType::Fixed => Money::from_cents(self.value.max(0)),
        }
    }
}

// =============================================================================
// Commission Setting
// =============================================================================

/// The marketplace commission singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSetting {
    pub rate: Rate,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// A fully reconciled price, derived on demand and frozen onto a booking.
///
/// ## Invariants
/// - `discount_amount <= original_price`
/// - `final_price = original_price - discount_amount`
/// - `platform_fee = round(final_price × commission_rate)`
/// - `provider_earnings = round(final_price × (100% - commission_rate))`
///
/// Fee and earnings are rounded independently, so their sum may differ from
/// `final_price` by one minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub original_price: Money,
    pub discount_amount: Money,
    pub final_price: Money,
    pub platform_fee: Money,
    pub provider_earnings: Money,
    pub coupon_code: Option<String>,
    pub commission_rate: Rate,
}

// =============================================================================
// Service
// =============================================================================

/// The parts of a listed service the booking core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub provider_id: String,
    pub title: String,
}

// =============================================================================
// Booking Status
// =============================================================================

/// Lifecycle state of a booking.
///
/// ```text
/// Pending ──(verified payment)──► Confirmed ──(ticket scan)──► Completed
///    │                                │
///    └──────────► Cancelled ◄─────────┘   (external)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

/// Whether the payment processor has captured funds for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A customer's booking of a service.
///
/// ## Invariants
/// - `ticket_code.is_some()` iff `payment_status == Paid`
/// - `is_ticket_used` implies `status == Completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub service_id: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub booking_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub check_in: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub check_out: Option<NaiveDate>,
    pub guests_count: i64,
    /// Quoted at checkout, frozen at confirmation.
    pub price: PriceBreakdown,
    pub ticket_code: Option<String>,
    pub is_ticket_used: bool,
    #[ts(as = "Option<String>")]
    pub ticket_used_at: Option<DateTime<Utc>>,
    /// Processor transaction id of the confirming payment.
    pub payment_reference: Option<String>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// True if the booking has been paid for.
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// True if a provider may scan this booking's ticket right now.
    #[inline]
    pub fn is_redeemable(&self) -> bool {
        self.status == BookingStatus::Confirmed && !self.is_ticket_used
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
