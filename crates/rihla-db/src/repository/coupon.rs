//! # Coupon Repository
//!
//! Coupon lookup and the atomic usage counter.
//!
//! ## Usage Counting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two webhooks confirm bookings with the same max_usage = 1 coupon       │
//! │                                                                         │
//! │  A: UPDATE ... WHERE code = ? AND current_usage < max_usage  → 1 row   │
//! │  B: UPDATE ... WHERE code = ? AND current_usage < max_usage  → 0 rows  │
//! │                                                                         │
//! │  The check and the increment are one statement, so no read-then-write  │
//! │  window exists between them.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use rihla_core::validation::validate_coupon;
use rihla_core::{Coupon, DiscountType};

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    code: String,
    discount_type: DiscountType,
    value: i64,
    max_usage: Option<i64>,
    current_usage: i64,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Coupon {
            code: row.code,
            discount_type: row.discount_type,
            value: row.value,
            max_usage: row.max_usage,
            current_usage: row.current_usage,
            expires_at: row.expires_at,
            is_active: row.is_active,
        }
    }
}

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Gets a coupon by its canonical (normalized) code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT code, discount_type, value, max_usage, current_usage, expires_at, is_active
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }

    /// Inserts a coupon.
    ///
    /// The coupon must pass `validate_coupon`: a code that is not in
    /// canonical form could never be matched by a lookup.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        validate_coupon(coupon)?;
        debug!(code = %coupon.code, "Inserting coupon");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO coupons (
                code, discount_type, value, max_usage, current_usage,
                expires_at, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.value)
        .bind(coupon.max_usage)
        .bind(coupon.current_usage)
        .bind(coupon.expires_at)
        .bind(coupon.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &coupon.code),
            other => other,
        })?;

        Ok(())
    }

    /// Increments usage by one unless the limit is reached.
    ///
    /// Returns `false` when the coupon is missing or already at `max_usage`.
    pub async fn increment_usage(&self, code: &str) -> DbResult<bool> {
        increment_usage_with(&self.pool, code).await
    }

    /// Number of stored coupons.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// The "increment if below limit" statement on any executor, so the booking
/// repository can run it inside its confirmation transaction.
pub(crate) async fn increment_usage_with<'e, E>(executor: E, code: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE coupons SET
            current_usage = current_usage + 1,
            updated_at = ?2
        WHERE code = ?1
          AND (max_usage IS NULL OR current_usage < max_usage)
        "#,
    )
    .bind(code)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
