use crate::calc::calculate_invoice_on;
use crate::model::{
    number_or_text, CustomServiceItem, Invoice, Rate, SelectedServices, ServiceCatalogEntry,
    SubcontractorItem,
};
use chrono::{DateTime, Local, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The fuel surcharge percentage used when none is given.
pub const DEFAULT_FUEL_SURCHARGE: f64 = 15.0;

fn default_fuel_surcharge() -> f64 {
    DEFAULT_FUEL_SURCHARGE
}

/// Rounds a percentage to the two decimals it is stored with, halves away from zero.
pub fn stored_percent(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// The billing inputs of a single towing job as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub customer_name: String,
    pub invoice_number: String,
    pub vehicle_type: String,
    /// Vehicle weight in pounds.
    pub vehicle_weight: i64,
    pub problem_description: String,
    /// Fuel surcharge in percent, e.g. `15.0`.
    #[serde(
        default = "default_fuel_surcharge",
        deserialize_with = "number_or_text::deserialize"
    )]
    pub fuel_surcharge: f64,
}

impl Default for JobInfo {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            invoice_number: String::new(),
            vehicle_type: String::new(),
            vehicle_weight: 0,
            problem_description: String::new(),
            fuel_surcharge: DEFAULT_FUEL_SURCHARGE,
        }
    }
}

/// A persisted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    /// The user that created the job. `None` once that user has been deleted.
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub info: JobInfo,
    pub created_at: DateTime<Utc>,
}

/// A selected service as stored for a job. The name and rate are copied from the catalog at the
/// time the invoice was saved so that later rate edits do not change old invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceServiceRecord {
    pub id: i64,
    pub job_id: i64,
    pub service_id: i64,
    pub service_name: String,
    pub rate: String,
    pub cost: f64,
}

/// The data needed to insert an [`InvoiceServiceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceService {
    pub service_id: i64,
    pub service_name: String,
    pub rate: String,
    pub cost: f64,
}

/// A photo attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPhoto {
    pub id: i64,
    pub job_id: i64,
    /// The public URL path of the stored file, e.g. `/uploads/jobs/3/4b1c....jpg`.
    pub photo_path: String,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
}

/// A job together with everything stored for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub invoice_services: Vec<InvoiceServiceRecord>,
    pub custom_services: Vec<CustomServiceItem>,
    pub subcontractors: Vec<SubcontractorItem>,
    pub photos: Vec<JobPhoto>,
}

impl JobDetail {
    /// Rebuilds the invoice of a saved job from its stored records, dated on the day the job was
    /// created.
    pub fn invoice(&self) -> Invoice {
        let catalog: Vec<ServiceCatalogEntry> = self
            .invoice_services
            .iter()
            .map(|s| ServiceCatalogEntry {
                id: s.service_id,
                name: s.service_name.clone(),
                rate: Rate::Text(s.rate.clone()),
            })
            .collect();
        let selection = SelectedServices::from_ids(catalog.iter().map(|s| s.id));
        let date = self.job.created_at.with_timezone(&Local).date_naive();
        calculate_invoice_on(
            &self.job.info,
            &selection,
            &catalog,
            &self.subcontractors,
            &self.custom_services,
            date,
        )
    }
}
