//! # Commission Repository
//!
//! The platform commission rate: a single row with `id = 1`.
//! The pricing engine only reads it; admin tooling updates it in place.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::rate_from_column;
use rihla_core::{CommissionSetting, Rate};

#[derive(Debug, sqlx::FromRow)]
struct CommissionRow {
    rate_bps: i64,
    updated_at: DateTime<Utc>,
}

/// Repository for the commission setting.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    /// Reads the current commission setting, `None` if it was never set.
    pub async fn get(&self) -> DbResult<Option<CommissionSetting>> {
        let row: Option<CommissionRow> = sqlx::query_as(
            "SELECT rate_bps, updated_at FROM commission_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CommissionSetting {
                rate: rate_from_column("commission_settings", row.rate_bps)?,
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    /// Sets the commission rate (insert or update the singleton row).
    pub async fn set_rate(&self, rate: Rate) -> DbResult<CommissionSetting> {
        let now = Utc::now();

        info!(rate_bps = rate.bps(), "Updating commission rate");

        sqlx::query(
            r#"
            INSERT INTO commission_settings (id, rate_bps, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                rate_bps = excluded.rate_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(rate.bps() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(CommissionSetting {
            rate,
            updated_at: now,
        })
    }
}
