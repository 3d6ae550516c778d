//! Checks that the callers of the invoice calculator apply before accepting user input. The
//! calculator itself accepts anything.

use crate::error::validation;
use crate::model::{
    CompanySettings, CustomServiceItem, JobInfo, SelectedServices, ServiceCatalogEntry,
    SubcontractorItem,
};
use crate::Result;

/// The message shown when an invoice is requested without services or weight.
pub const NOT_READY_MESSAGE: &str =
    "Please select at least one service and ensure vehicle weight is entered.";

/// Validates job fields before a job is stored.
pub fn job_info(info: &JobInfo) -> Result<()> {
    let required = [
        (&info.customer_name, "Customer name is required"),
        (&info.invoice_number, "Invoice number is required"),
        (&info.vehicle_type, "Vehicle type is required"),
        (&info.problem_description, "Problem description is required"),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(validation(message));
        }
    }
    if info.vehicle_weight < 1 {
        return Err(validation("Vehicle weight must be greater than 0"));
    }
    fuel_surcharge(info.fuel_surcharge)
}

/// A fuel surcharge is a percentage between 0 and 100.
pub fn fuel_surcharge(value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(validation("Fuel surcharge must be between 0 and 100"));
    }
    Ok(())
}

/// Settings need a company name and a valid default surcharge.
pub fn company_settings(settings: &CompanySettings) -> Result<()> {
    if settings.company_name.trim().is_empty() {
        return Err(validation("Company name is required"));
    }
    fuel_surcharge(settings.default_fuel_surcharge)
}

/// An invoice needs at least one selected service that exists in the catalog and a vehicle weight.
pub fn ready_for_invoice(
    info: &JobInfo,
    selection: &SelectedServices,
    catalog: &[ServiceCatalogEntry],
) -> Result<()> {
    let any_selected = catalog.iter().any(|s| selection.is_selected(s.id));
    if !any_selected || info.vehicle_weight == 0 {
        return Err(validation(NOT_READY_MESSAGE));
    }
    Ok(())
}

/// Line items need a name and a finite price.
pub fn line_items(custom: &[CustomServiceItem], subcontractors: &[SubcontractorItem]) -> Result<()> {
    for item in custom {
        if item.name.trim().is_empty() {
            return Err(validation("Custom service name is required"));
        }
        if !item.price.value().is_finite() {
            return Err(validation(format!("Invalid price for '{}'", item.name)));
        }
    }
    for item in subcontractors {
        if item.name.trim().is_empty() {
            return Err(validation("Subcontractor name is required"));
        }
        if !item.price.value().is_finite() {
            return Err(validation(format!("Invalid price for '{}'", item.name)));
        }
    }
    Ok(())
}
