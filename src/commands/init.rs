use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - Creates an initial `config.json` file with default settings
/// - Creates the uploads directory
/// - Creates the SQLite database and seeds the towing service catalog
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/towbill`
/// - `bind_addr` - The address `towbill serve` listens on, saved to the config file.
///
/// # Errors
/// - Returns an error if any file operations fail or if the database already exists.
pub async fn init(home: &Path, bind_addr: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(home, bind_addr)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the towbill directory at {}",
        config.root().display()
    )
    .into())
}
