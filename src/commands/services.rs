use crate::commands::Out;
use crate::model::ServiceCatalogEntry;
use crate::{Config, Result};
use std::fmt::Write;

/// Lists the towing service catalog, one service per line.
pub async fn services_list(config: Config) -> Result<Out<Vec<ServiceCatalogEntry>>> {
    let services = config.db().list_services().await?;
    let mut message = format!("{} towing services:", services.len());
    for service in &services {
        let _ = write!(
            message,
            "\n{:>4}  {:>6.2}¢/lb  {}",
            service.id,
            service.rate.cents_per_lb(),
            service.name
        );
    }
    Ok(Out::new(message, services))
}

/// Sets the rate of service `id` to `rate` cents per pound.
///
/// # Errors
/// - Returns a validation error if `rate` is not a non-negative number with at most two decimal
///   places.
/// - Returns a not found error if there is no such service.
pub async fn services_set_rate(
    config: Config,
    id: i64,
    rate: &str,
) -> Result<Out<ServiceCatalogEntry>> {
    let service = config.db().update_service_rate(id, rate).await?;
    let message = format!("Set the rate of '{}' to {}¢/lb", service.name, service.rate);
    Ok(Out::new(message, service))
}
