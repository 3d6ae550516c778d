//! This module is responsible for reading, writing and managing the SQLite database

mod company;
mod jobs;
mod migrations;
mod photos;
mod services;
mod users;


use crate::error::validation;
use crate::Result;
use anyhow::{bail, Context};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

/// The schema version this build of the program expects.
const CURRENT_VERSION: i32 = 2;

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite connection pool
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;

        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Unable to read the schema version")?;
        let version = row.0;
        if version > CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({CURRENT_VERSION})"
            );
        }
        if version < CURRENT_VERSION {
            info!("Migrating database from version {version} to {CURRENT_VERSION}");
        }
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        migrations::run(&pool, 0, CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

/// Converts a percentage to the stored `numeric(5,2)` text form, e.g. `12.5`.
fn percent_to_text(value: f64) -> Result<String> {
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| validation(format!("Invalid percentage {value}")))?;
    Ok(decimal
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string())
}

fn percent_from_text(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid percentage '{text}' in database"))
}
