use crate::commands::Out;
use crate::{http, Config, Result};
use tracing::warn;

/// Runs the REST API until the process is stopped.
///
/// # Arguments
/// - `config` - The loaded configuration.
/// - `bind_addr` - Listen here instead of the address in the config file.
pub async fn serve(config: Config, bind_addr: Option<&str>) -> Result<Out<()>> {
    let config = match bind_addr {
        Some(addr) => config.with_bind_addr(addr),
        None => config,
    };
    if config.db().user_count().await? == 0 {
        warn!("There are no users yet, create one with 'towbill user add NAME --password PW --role admin'");
    }
    http::serve(config).await?;
    Ok("The server has stopped".into())
}
