//! Types that represent the core data model, such as `JobInfo`, `Invoice` and `CompanySettings`.
mod amount;
mod company;
mod invoice;
mod job;
mod line_item;
mod selection;
mod service;
mod user;
pub mod validate;

pub use amount::{format_count, Amount, AmountError};
pub use company::{
    CompanySettings, CompanySettingsPatch, DEFAULT_COMPANY_LOGO, DEFAULT_COMPANY_NAME,
    DEFAULT_COMPANY_SUBTITLE, DEFAULT_INVOICE_FOOTER,
};
pub use invoice::{Invoice, InvoiceRequest, ServiceWithCost};
pub use job::{
    stored_percent, InvoiceServiceRecord, Job, JobDetail, JobInfo, JobPhoto, NewInvoiceService,
    DEFAULT_FUEL_SURCHARGE,
};
pub use line_item::{CustomServiceItem, SubcontractorItem};
pub use selection::SelectedServices;
pub use service::{default_catalog, Rate, ServiceCatalogEntry, DEFAULT_CATALOG};
pub use user::{Company, NewUser, Role, User, Viewer};

/// Deserializes numbers that arrive either as JSON numbers or as decimal text, which is how
/// `numeric` columns are commonly exchanged.
pub(crate) mod number_or_text {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn coerce<E: serde::de::Error>(raw: Raw) -> Result<f64, E> {
        match raw {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("Expected a number, got '{s}'"))),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        coerce(Raw::deserialize(deserializer)?)
    }

    pub(crate) fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => coerce(raw).map(Some),
            None => Ok(None),
        }
    }
}
