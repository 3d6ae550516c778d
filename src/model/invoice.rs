use crate::calc::calculate_invoice;
use crate::model::{
    CustomServiceItem, JobInfo, NewInvoiceService, SelectedServices, ServiceCatalogEntry,
    SubcontractorItem,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A selected catalog service with its computed cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWithCost {
    pub id: i64,
    pub name: String,
    /// Cents per pound, already coerced to a number.
    pub rate: f64,
    /// Dollars.
    pub cost: f64,
}

/// A fully computed invoice. Invoices are snapshots: when any input changes a new one is
/// computed rather than this one being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(flatten)]
    pub job: JobInfo,
    pub services: Vec<ServiceWithCost>,
    pub custom_services: Vec<CustomServiceItem>,
    pub subcontractors: Vec<SubcontractorItem>,
    pub subtotal: f64,
    pub custom_services_total: f64,
    pub subcontractor_total: f64,
    pub fuel_surcharge_amount: f64,
    pub total: f64,
    pub date: NaiveDate,
}

impl Invoice {
    /// The cost records to store for the selected services of this invoice.
    pub fn service_records(&self) -> Vec<NewInvoiceService> {
        self.services
            .iter()
            .map(|s| NewInvoiceService {
                service_id: s.id,
                service_name: s.name.clone(),
                rate: s.rate.to_string(),
                cost: s.cost,
            })
            .collect()
    }

    /// The base the fuel surcharge percentage is applied to.
    pub fn surcharge_base(&self) -> f64 {
        self.subtotal + self.custom_services_total
    }
}

/// The inputs of an invoice calculation as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub job: JobInfo,
    pub selected_services: SelectedServices,
    #[serde(default)]
    pub custom_services: Vec<CustomServiceItem>,
    #[serde(default)]
    pub subcontractors: Vec<SubcontractorItem>,
    /// A catalog to price against instead of the stored one. Only honored for offline
    /// calculations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceCatalogEntry>>,
}

impl InvoiceRequest {
    /// Computes the invoice against `catalog`, dated today.
    pub fn calculate(&self, catalog: &[ServiceCatalogEntry]) -> Invoice {
        calculate_invoice(
            &self.job,
            &self.selected_services,
            catalog,
            &self.subcontractors,
            &self.custom_services,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_catalog;

    #[test]
    fn test_request_from_client_json() {
        let json = r#"{
            "job": {
                "customerName": "Acme Freight",
                "invoiceNumber": "1001",
                "vehicleType": "Semi",
                "vehicleWeight": 10000,
                "problemDescription": "Rollover",
                "fuelSurcharge": 15
            },
            "selectedServices": {"1": true, "2": false}
        }"#;
        let request: InvoiceRequest = serde_json::from_str(json).unwrap();
        assert!(request.custom_services.is_empty());
        assert!(request.services.is_none());
        let invoice = request.calculate(&default_catalog());
        assert_eq!(invoice.services.len(), 1);
        assert!((invoice.total - 460.0).abs() < 1e-9);
        assert!((invoice.surcharge_base() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_service_records() {
        let request = InvoiceRequest {
            job: JobInfo {
                vehicle_weight: 2000,
                ..JobInfo::default()
            },
            selected_services: SelectedServices::from_ids([3]),
            custom_services: vec![],
            subcontractors: vec![],
            services: None,
        };
        let records = request.calculate(&default_catalog()).service_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service_id, 3);
        assert_eq!(records[0].service_name, "Salvage/Debris Recovery");
        assert_eq!(records[0].rate, "5.5");
        assert_eq!(records[0].cost, 110.0);
    }

    #[test]
    fn test_invoice_json_is_flat_camel_case() {
        let request = InvoiceRequest {
            job: JobInfo {
                customer_name: "Acme".to_string(),
                vehicle_weight: 1000,
                ..JobInfo::default()
            },
            selected_services: SelectedServices::from_ids([1]),
            custom_services: vec![],
            subcontractors: vec![],
            services: None,
        };
        let value = serde_json::to_value(request.calculate(&default_catalog())).unwrap();
        assert_eq!(value["customerName"], "Acme");
        let surcharge = value["fuelSurchargeAmount"].as_f64().unwrap();
        assert!((surcharge - 6.0).abs() < 1e-9);
        assert!(value["date"].is_string());
    }
}
