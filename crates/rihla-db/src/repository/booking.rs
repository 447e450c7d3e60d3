//! # Booking Repository
//!
//! Database operations for bookings and their tickets.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Booking Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_pending() → pending / unpaid, breakdown frozen          │
//! │                                                                         │
//! │  2. CONFIRM (payment webhook)                                          │
//! │     └── confirm_payment() → confirmed / paid, ticket minted            │
//! │     └── (coupon usage incremented in the same transaction)             │
//! │                                                                         │
//! │  3. REDEEM (provider scan)                                             │
//! │     └── redeem() → completed, is_ticket_used = 1                       │
//! │                                                                         │
//! │  4. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel() → cancelled                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is a single conditional `UPDATE` whose `WHERE` clause
//! names the state it leaves. `rows_affected() == 0` means another request
//! got there first (or the booking was never in that state).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::coupon::increment_usage_with;
use crate::repository::rate_from_column;
use rihla_core::{
    Booking, BookingStatus, Money, PaymentStatus, PriceBreakdown, Service, TicketCode,
};

/// Column list shared by every booking SELECT (table alias `b`).
const BOOKING_COLUMNS: &str = r#"
    b.id AS id,
    b.user_id AS user_id,
    b.service_id AS service_id,
    b.status AS status,
    b.payment_status AS payment_status,
    b.booking_date AS booking_date,
    b.check_in AS check_in,
    b.check_out AS check_out,
    b.guests_count AS guests_count,
    b.original_price_cents AS original_price_cents,
    b.discount_cents AS discount_cents,
    b.final_price_cents AS final_price_cents,
    b.platform_fee_cents AS platform_fee_cents,
    b.provider_earnings_cents AS provider_earnings_cents,
    b.commission_rate_bps AS commission_rate_bps,
    b.coupon_code AS coupon_code,
    b.ticket_code AS ticket_code,
    b.is_ticket_used AS is_ticket_used,
    b.ticket_used_at AS ticket_used_at,
    b.payment_reference AS payment_reference,
    b.confirmed_at AS confirmed_at,
    b.created_at AS created_at,
    b.updated_at AS updated_at
"#;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    user_id: String,
    service_id: String,
    status: BookingStatus,
    payment_status: PaymentStatus,
    booking_date: NaiveDate,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests_count: i64,
    original_price_cents: i64,
    discount_cents: i64,
    final_price_cents: i64,
    platform_fee_cents: i64,
    provider_earnings_cents: i64,
    commission_rate_bps: i64,
    coupon_code: Option<String>,
    ticket_code: Option<String>,
    is_ticket_used: bool,
    ticket_used_at: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> DbResult<Self> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            service_id: row.service_id,
            status: row.status,
            payment_status: row.payment_status,
            booking_date: row.booking_date,
            check_in: row.check_in,
            check_out: row.check_out,
            guests_count: row.guests_count,
            price: PriceBreakdown {
                original_price: Money::from_cents(row.original_price_cents),
                discount_amount: Money::from_cents(row.discount_cents),
                final_price: Money::from_cents(row.final_price_cents),
                platform_fee: Money::from_cents(row.platform_fee_cents),
                provider_earnings: Money::from_cents(row.provider_earnings_cents),
                coupon_code: row.coupon_code,
                commission_rate: rate_from_column("bookings", row.commission_rate_bps)?,
            },
            ticket_code: row.ticket_code,
            is_ticket_used: row.is_ticket_used,
            ticket_used_at: row.ticket_used_at,
            payment_reference: row.payment_reference,
            confirmed_at: row.confirmed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    service_provider_id: String,
    service_title: String,
}

// =============================================================================
// Inputs & Outcomes
// =============================================================================

/// A booking about to be created in `pending / unpaid`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub service_id: String,
    pub booking_date: NaiveDate,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests_count: i64,
    /// Breakdown quoted at checkout, frozen onto the booking.
    pub price: PriceBreakdown,
}

/// What happened to the booking's coupon during confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponUsage {
    /// Booking has no coupon.
    NotApplicable,
    /// Usage counter went up by one.
    Incremented,
    /// Coupon was already at its limit (or has been deleted); usage unchanged.
    LimitReached,
}

/// Result of [`BookingRepository::confirm_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// This call moved the booking to `confirmed / paid`.
    Confirmed {
        booking: Booking,
        coupon_usage: CouponUsage,
    },
    /// Booking was already paid; nothing changed.
    AlreadyPaid(Booking),
    /// No booking with that id.
    NotFound,
    /// Booking is unpaid but not pending (e.g. cancelled); nothing changed.
    InvalidState(Booking),
}

/// A booking found by ticket code, with the service it books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLookup {
    pub booking: Booking,
    pub service: Service,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        fetch_booking(&self.pool, id).await
    }

    /// Creates a booking in `pending / unpaid` with the quoted breakdown.
    pub async fn create_pending(&self, new: &NewBooking) -> DbResult<Booking> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, service_id = %new.service_id, "Creating pending booking");

        let booking = Booking {
            id,
            user_id: new.user_id.clone(),
            service_id: new.service_id.clone(),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            booking_date: new.booking_date,
            check_in: new.check_in,
            check_out: new.check_out,
            guests_count: new.guests_count,
            price: new.price.clone(),
            ticket_code: None,
            is_ticket_used: false,
            ticket_used_at: None,
            payment_reference: None,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, service_id, status, payment_status,
                booking_date, check_in, check_out, guests_count,
                original_price_cents, discount_cents, final_price_cents,
                platform_fee_cents, provider_earnings_cents, commission_rate_bps,
                coupon_code, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?17
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(&booking.service_id)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.booking_date)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.guests_count)
        .bind(booking.price.original_price.cents())
        .bind(booking.price.discount_amount.cents())
        .bind(booking.price.final_price.cents())
        .bind(booking.price.platform_fee.cents())
        .bind(booking.price.provider_earnings.cents())
        .bind(booking.price.commission_rate.bps() as i64)
        .bind(&booking.price.coupon_code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Confirms payment: `pending / unpaid → confirmed / paid`, mints the
    /// ticket and counts the coupon, all in one transaction.
    ///
    /// ## Outcomes
    /// - `Confirmed` - this call did the transition
    /// - `AlreadyPaid` - a previous delivery did; no re-mint, no second increment
    /// - `NotFound` / `InvalidState` - nothing changed
    ///
    /// A coupon already at its limit does not undo the confirmation: the
    /// payment has been captured. The caller is told via `CouponUsage`.
    pub async fn confirm_payment(
        &self,
        booking_id: &str,
        ticket: &TicketCode,
        payment_reference: &str,
        now: DateTime<Utc>,
    ) -> DbResult<ConfirmOutcome> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'confirmed',
                payment_status = 'paid',
                ticket_code = ?2,
                is_ticket_used = 0,
                ticket_used_at = NULL,
                payment_reference = ?3,
                confirmed_at = ?4,
                updated_at = ?4
            WHERE id = ?1
              AND status = 'pending'
              AND payment_status = 'unpaid'
            "#,
        )
        .bind(booking_id)
        .bind(ticket.as_str())
        .bind(payment_reference)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Release the connection before reading the current state
            tx.rollback().await?;
            return Ok(match self.get_by_id(booking_id).await? {
                None => ConfirmOutcome::NotFound,
                Some(booking) if booking.is_paid() => ConfirmOutcome::AlreadyPaid(booking),
                Some(booking) => ConfirmOutcome::InvalidState(booking),
            });
        }

        let booking = fetch_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", booking_id))?;

        let coupon_usage = match booking.price.coupon_code.as_deref() {
            None => CouponUsage::NotApplicable,
            Some(code) => {
                if increment_usage_with(&mut *tx, code).await? {
                    CouponUsage::Incremented
                } else {
                    warn!(
                        booking_id = %booking_id,
                        coupon = %code,
                        "Coupon limit already reached at confirmation; usage not incremented"
                    );
                    CouponUsage::LimitReached
                }
            }
        };

        tx.commit().await?;

        info!(booking_id = %booking_id, payment_reference = %payment_reference, "Booking confirmed");

        Ok(ConfirmOutcome::Confirmed {
            booking,
            coupon_usage,
        })
    }

    /// Finds a booking by canonical ticket code, joined with its service.
    pub async fn find_by_ticket(&self, ticket_code: &str) -> DbResult<Option<TicketLookup>> {
        let sql = format!(
            r#"
            SELECT {},
                s.provider_id AS service_provider_id,
                s.title AS service_title
            FROM bookings b
            JOIN services s ON s.id = b.service_id
            WHERE b.ticket_code = ?1
            "#,
            BOOKING_COLUMNS
        );

        let row: Option<TicketRow> = sqlx::query_as(&sql)
            .bind(ticket_code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let booking = Booking::try_from(row.booking)?;
            let service = Service {
                id: booking.service_id.clone(),
                provider_id: row.service_provider_id,
                title: row.service_title,
            };
            Ok(TicketLookup { booking, service })
        })
        .transpose()
    }

    /// Marks a ticket used and completes its booking, exactly once.
    ///
    /// Returns `false` if the ticket is unknown, already used, or its booking
    /// is not `confirmed`. `ticket_used_at` is written only by the winning call.
    pub async fn redeem(&self, ticket_code: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                is_ticket_used = 1,
                ticket_used_at = ?2,
                status = 'completed',
                updated_at = ?2
            WHERE ticket_code = ?1
              AND is_ticket_used = 0
              AND status = 'confirmed'
            "#,
        )
        .bind(ticket_code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancels a booking that has not been completed.
    ///
    /// Returns `false` if it is missing, completed or already cancelled.
    pub async fn cancel(&self, booking_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1
              AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(booking_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

async fn fetch_booking<'e, E>(executor: E, id: &str) -> DbResult<Option<Booking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM bookings b WHERE b.id = ?1", BOOKING_COLUMNS);

    let row: Option<BookingRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.map(Booking::try_from).transpose()
}

// =============================================================================
// Unit Tests
// =============================================================================
