//! The towing service catalog.

use super::Db;
use crate::error::{not_found, IntoResult};
use crate::model::{Rate, ServiceCatalogEntry, DEFAULT_CATALOG};
use crate::{ErrorType, Result};
use anyhow::Context;
use tracing::{debug, info};

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    name: String,
    rate: String,
}

impl From<ServiceRow> for ServiceCatalogEntry {
    fn from(row: ServiceRow) -> Self {
        ServiceCatalogEntry {
            id: row.id,
            name: row.name,
            rate: Rate::Text(row.rate),
        }
    }
}

impl Db {
    /// Inserts the default catalog when the catalog is empty. Returns the number of rows added.
    pub(crate) async fn seed_services(&self) -> Result<usize> {
        let mut tx = self.pool().begin().await.context("Failed to begin transaction")?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM towing_services")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count services")?;
        if count > 0 {
            debug!("Service catalog already has {count} rows, skipping seed");
            return Ok(0);
        }
        for &(name, rate) in DEFAULT_CATALOG {
            sqlx::query("INSERT INTO towing_services (name, rate) VALUES (?, ?)")
                .bind(name)
                .bind(rate)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to seed service '{name}'"))?;
        }
        tx.commit().await.context("Failed to commit service seed")?;
        info!("Seeded {} towing services", DEFAULT_CATALOG.len());
        Ok(DEFAULT_CATALOG.len())
    }

    /// Returns the catalog ordered by id.
    pub(crate) async fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>> {
        let rows: Vec<ServiceRow> =
            sqlx::query_as("SELECT id, name, rate FROM towing_services ORDER BY id")
                .fetch_all(self.pool())
                .await
                .context("Failed to list services")
                .pub_result(ErrorType::Database)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub(crate) async fn get_service(&self, id: i64) -> Result<ServiceCatalogEntry> {
        let row: Option<ServiceRow> =
            sqlx::query_as("SELECT id, name, rate FROM towing_services WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .context("Failed to get service")
                .pub_result(ErrorType::Database)?;
        row.map(Into::into)
            .ok_or_else(|| not_found(format!("Service {id} not found")))
    }

    /// Validates and normalizes `rate` then stores it. Returns the updated entry.
    pub(crate) async fn update_service_rate(
        &self,
        id: i64,
        rate: &str,
    ) -> Result<ServiceCatalogEntry> {
        let rate = Rate::parse_stored(rate)?;
        let result = sqlx::query("UPDATE towing_services SET rate = ? WHERE id = ?")
            .bind(&rate)
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to update service rate")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("Service {id} not found")));
        }
        info!("Service {id} rate set to {rate}");
        self.get_service(id).await
    }
}
