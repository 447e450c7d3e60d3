//! # rihla-db: Database Layer for Rihla Bookings
//!
//! This crate provides persistence for the Rihla booking backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rihla Data Flow                                  │
//! │                                                                         │
//! │  Service (PricingEngine / on_payment_confirmed / redeem_ticket)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     rihla-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CommissionRepo│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CouponRepo    │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │    │ ServiceRepo   │    │   schema.sql │  │   │
//! │  │   │ Management    │    │ BookingRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (DATABASE_PATH, WAL mode)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rihla_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./rihla.db")).await?;
//!
//! let coupon = db.coupons().get_by_code("SAVE10").await?;
//! let won = db.bookings().redeem("TKT-...", Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::{
    BookingRepository, ConfirmOutcome, CouponUsage, NewBooking, TicketLookup,
};
pub use repository::commission::CommissionRepository;
pub use repository::coupon::CouponRepository;
pub use repository::service::ServiceRepository;
