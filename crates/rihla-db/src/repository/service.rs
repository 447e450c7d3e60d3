//! # Service Repository
//!
//! Services are owned by the catalog; this crate only needs their owner and
//! title, for redemption checks and ticket display.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use rihla_core::Service;

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    provider_id: String,
    title: String,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            provider_id: row.provider_id,
            title: row.title,
        }
    }
}

/// Repository for service lookups.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Gets a service by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let row: Option<ServiceRow> =
            sqlx::query_as("SELECT id, provider_id, title FROM services WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Service::from))
    }

    /// Inserts a service.
    pub async fn insert(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, provider_id = %service.provider_id, "Inserting service");

        sqlx::query(
            "INSERT INTO services (id, provider_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&service.id)
        .bind(&service.provider_id)
        .bind(&service.title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = Service {
            id: "svc-1".to_string(),
            provider_id: "prov-1".to_string(),
            title: "Desert Safari".to_string(),
        };

        db.services().insert(&service).await.unwrap();

        assert_eq!(db.services().get_by_id("svc-1").await.unwrap(), Some(service));
        assert!(db.services().get_by_id("svc-2").await.unwrap().is_none());
    }
}
