//! Schema migrations for the towbill database.
//!
//! Each schema version `N` has a `migration_NN_up.sql` that builds it from version `N-1` and a
//! `migration_NN_down.sql` that takes it back. Version 1 holds tenants, users, the catalog, jobs
//! and invoices; version 2 adds job photos.

use anyhow::Context;
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        up_sql: include_str!("migration_01_up.sql"),
        down_sql: include_str!("migration_01_down.sql"),
    },
    Migration {
        version: 2,
        up_sql: include_str!("migration_02_up.sql"),
        down_sql: include_str!("migration_02_down.sql"),
    },
];

/// One migration script and the schema version the database is at once it has run.
struct Step {
    sql: &'static str,
    version_after: i32,
    label: String,
}

/// Resolves every script needed to move from `from` to `to`, failing before anything runs if one
/// is missing.
fn plan(from: i32, to: i32) -> Result<Vec<Step>> {
    let find = |version: i32| {
        MIGRATIONS.iter().find(|m| m.version == version).with_context(|| {
            format!("No migration for schema version {version}, cannot go from {from} to {to}")
        })
    };
    let mut steps = Vec::new();
    if from < to {
        for version in from + 1..=to {
            steps.push(Step {
                sql: find(version)?.up_sql,
                version_after: version,
                label: format!("{version:02} up"),
            });
        }
    } else {
        for version in (to + 1..=from).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                version_after: version - 1,
                label: format!("{version:02} down"),
            });
        }
    }
    Ok(steps)
}

/// Moves the schema from version `from` to version `to`, up or down. Each script runs in its own
/// transaction together with the `schema_version` update.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    if from == to {
        debug!("Schema already at version {to}");
        return Ok(());
    }
    for step in plan(from, to)? {
        debug!("Running migration {}", step.label);
        apply(pool, &step).await?;
    }
    debug!("Schema now at version {to}");
    Ok(())
}

async fn apply(pool: &SqlitePool, step: &Step) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;
    tx.execute(step.sql)
        .await
        .with_context(|| format!("Migration {} failed", step.label))?;
    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.version_after)
        .execute(&mut *tx)
        .await
        .context("Failed to record schema_version")?;
    tx.commit()
        .await
        .with_context(|| format!("Failed to commit migration {}", step.label))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    /// Helper to create a test database with schema_version bootstrapped at version 0.
    async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let db_path = temp_dir.path().join("test.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .context("Failed to parse SQLite connection string")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create SQLite database")?;

        // Bootstrap schema_version table
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;

        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        Ok((temp_dir, pool))
    }

    /// Helper to get current schema version from database.
    async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .context("Failed to query schema version")?;
        Ok(row.0)
    }

    /// Helper to check if a table exists.
    async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .context("Failed to check table existence")?;
        Ok(row.0 > 0)
    }

    #[tokio::test]
    async fn test_migration_up_creates_tables() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);

        run(&pool, 0, 1).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
        for table in [
            "companies",
            "users",
            "sessions",
            "company_settings",
            "towing_services",
            "jobs",
            "invoice_services",
            "job_custom_services",
            "job_subcontractors",
        ] {
            assert!(table_exists(&pool, table).await.unwrap(), "{table}");
        }
        assert!(!table_exists(&pool, "job_photos").await.unwrap());

        run(&pool, 1, 2).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 2);
        assert!(table_exists(&pool, "job_photos").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_down_drops_tables() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 2).await.unwrap();

        run(&pool, 2, 1).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
        assert!(!table_exists(&pool, "job_photos").await.unwrap());
        assert!(table_exists(&pool, "jobs").await.unwrap());

        run(&pool, 1, 0).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "jobs").await.unwrap());
        assert!(!table_exists(&pool, "users").await.unwrap());
        assert!(!table_exists(&pool, "towing_services").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_no_op_when_already_at_target() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 2).await.unwrap();
        run(&pool, 2, 2).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), 2);
    }

    #[test]
    fn test_plan_orders_steps() {
        let up = plan(0, 2).unwrap();
        assert_eq!(up.iter().map(|s| s.version_after).collect::<Vec<_>>(), [1, 2]);
        let down = plan(2, 0).unwrap();
        assert_eq!(down.iter().map(|s| s.version_after).collect::<Vec<_>>(), [1, 0]);
        assert_eq!(down[0].label, "02 down");
    }

    #[test]
    fn test_plan_fails_for_missing_migration() {
        assert!(plan(0, 3).is_err());
        assert!(plan(4, 1).is_err());
    }
}
