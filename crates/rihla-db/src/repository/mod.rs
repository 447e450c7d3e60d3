//! # Repository Module
//!
//! Database repository implementations for Rihla.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service (pricing / lifecycle / redemption)                            │
//! │       │                                                                 │
//! │       │  db.bookings().redeem("TKT-...", now)                          │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── create_pending(&self, new)                                        │
//! │  ├── confirm_payment(&self, id, ticket, reference, now)               │
//! │  ├── find_by_ticket(&self, code)                                       │
//! │  └── redeem(&self, code, now)                                          │
//! │       │                                                                 │
//! │       │  SQL (conditional UPDATE, rows_affected)                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into `*Row` structs (`sqlx::FromRow`) and converted into
//! rihla-core types at this boundary. Nothing above this module sees SQL
//! column types.
//!
//! ## Available Repositories
//!
//! - [`CommissionRepository`](commission::CommissionRepository) - Commission setting singleton
//! - [`CouponRepository`](coupon::CouponRepository) - Coupons and atomic usage counting
//! - [`ServiceRepository`](service::ServiceRepository) - Services (ownership lookups)
//! - [`BookingRepository`](booking::BookingRepository) - Booking lifecycle transitions

pub mod booking;
pub mod commission;
pub mod coupon;
pub mod service;

use rihla_core::Rate;

use crate::error::{DbError, DbResult};

/// Converts a stored basis-point column into a [`Rate`].
pub(crate) fn rate_from_column(entity: &'static str, bps: i64) -> DbResult<Rate> {
    u32::try_from(bps)
        .ok()
        .filter(|bps| *bps <= rihla_core::BPS_SCALE)
        .map(Rate::from_bps)
        .ok_or_else(|| DbError::corrupt(entity, format!("rate {} bps out of range", bps)))
}
