//! Configuration file handling for towbill.
//!
//! The configuration file is stored at `$TOWBILL_HOME/config.json` and contains settings for the
//! server and for invoice rendering. The home directory also holds the SQLite database and the
//! uploads directory for job photos and company logos.

use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "towbill";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const TOWBILL_SQLITE: &str = "towbill.sqlite";
const UPLOADS: &str = "uploads";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";
const RECENT_JOBS_LIMIT: u32 = 10;
const SESSION_TTL_HOURS: u32 = 24 * 7;
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const MAX_PHOTOS_PER_JOB: u32 = 10;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$TOWBILL_HOME` and from there it loads `$TOWBILL_HOME/config.json` and opens the
/// database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    uploads: PathBuf,
}

impl Config {
    /// Creates the home directory, the uploads directory, an initial `config.json` and a new
    /// SQLite database seeded with the default service catalog.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory, e.g. `$HOME/towbill`
    /// - `bind_addr` - The address the HTTP server listens on. Uses the default when `None`.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if a database already exists.
    pub async fn create(dir: impl Into<PathBuf>, bind_addr: Option<&str>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the towbill home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let db_path = root.join(TOWBILL_SQLITE);
        if db_path.exists() {
            bail!(
                "A towbill database already exists at '{}'",
                db_path.display()
            )
        }

        let uploads = root.join(UPLOADS);
        utils::make_dir(&uploads).await?;

        let config_path = root.join(CONFIG_JSON);
        let mut config_file = ConfigFile::default();
        if let Some(addr) = bind_addr {
            config_file.bind_addr = addr.to_string();
        }
        config_file.save(&config_path).await?;

        let db = Db::init(&db_path)
            .await
            .context("Unable to create SQLite DB")?;
        db.seed_services().await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
            uploads,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - open the database, migrating it if it is out of date
    /// - validate that the uploads directory exists
    pub async fn load(towbill_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = towbill_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The towbill home directory is missing, run 'towbill init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let db_path = root.join(TOWBILL_SQLITE);
        let db = Db::load(&db_path)
            .await
            .context("Unable to load SQLite DB")?;

        let config = Self {
            root: root.clone(),
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
            uploads: root.join(UPLOADS),
        };
        if !config.uploads.is_dir() {
            bail!(
                "The uploads directory is missing '{}'",
                config.uploads.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn uploads(&self) -> &Path {
        &self.uploads
    }

    pub fn bind_addr(&self) -> &str {
        &self.config_file.bind_addr
    }

    pub fn date_format(&self) -> &str {
        &self.config_file.date_format
    }

    pub fn recent_jobs_limit(&self) -> u32 {
        self.config_file.recent_jobs_limit
    }

    pub fn session_ttl_hours(&self) -> u32 {
        self.config_file.session_ttl_hours
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.config_file.max_upload_bytes
    }

    pub fn max_photos_per_job(&self) -> u32 {
        self.config_file.max_photos_per_job
    }

    /// Replaces the bind address for this process only; the config file is not rewritten.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_file.bind_addr = addr.into();
        self
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "towbill",
///   "config_version": 1,
///   "bind_addr": "127.0.0.1:5000",
///   "date_format": "%-m/%-d/%Y",
///   "recent_jobs_limit": 10,
///   "session_ttl_hours": 168,
///   "max_upload_bytes": 10485760,
///   "max_photos_per_job": 10
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "towbill"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Address and port the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    bind_addr: String,

    /// chrono format string used to print invoice dates
    #[serde(default = "default_date_format")]
    date_format: String,

    /// Number of jobs returned by the recent jobs listing
    #[serde(default = "default_recent_jobs_limit")]
    recent_jobs_limit: u32,

    /// Lifetime of a login session
    #[serde(default = "default_session_ttl_hours")]
    session_ttl_hours: u32,

    /// Largest accepted upload (photo or logo) in bytes
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: u64,

    /// Most photos that can be attached to one job
    #[serde(default = "default_max_photos_per_job")]
    max_photos_per_job: u32,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_recent_jobs_limit() -> u32 {
    RECENT_JOBS_LIMIT
}

fn default_session_ttl_hours() -> u32 {
    SESSION_TTL_HOURS
}

fn default_max_upload_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_max_photos_per_job() -> u32 {
    MAX_PHOTOS_PER_JOB
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            bind_addr: default_bind_addr(),
            date_format: default_date_format(),
            recent_jobs_limit: RECENT_JOBS_LIMIT,
            session_ttl_hours: SESSION_TTL_HOURS,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_photos_per_job: MAX_PHOTOS_PER_JOB,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
