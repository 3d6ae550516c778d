//! The invoice calculator.
//!
//! Selected catalog services are priced per pound: `cost = weight * rate / 100`, where the rate is
//! in cents per pound. Custom services and subcontractor charges are flat fees. The fuel surcharge
//! percentage applies to the service subtotal plus the custom services, but not to subcontractor
//! charges.
//!
//! The calculator does no validation and never fails. Unknown or unselected service ids are
//! ignored, zero or negative weights produce zero or negative costs, and a rate with no leading
//! number turns into `NaN` which then flows into the totals.

use crate::model::{
    CustomServiceItem, Invoice, JobInfo, SelectedServices, ServiceCatalogEntry, ServiceWithCost,
    SubcontractorItem,
};
use chrono::{Local, NaiveDate};

/// Computes an invoice dated today (local time).
pub fn calculate_invoice(
    job: &JobInfo,
    selected: &SelectedServices,
    catalog: &[ServiceCatalogEntry],
    subcontractors: &[SubcontractorItem],
    custom_services: &[CustomServiceItem],
) -> Invoice {
    calculate_invoice_on(
        job,
        selected,
        catalog,
        subcontractors,
        custom_services,
        Local::now().date_naive(),
    )
}

/// Computes an invoice dated `date`.
pub fn calculate_invoice_on(
    job: &JobInfo,
    selected: &SelectedServices,
    catalog: &[ServiceCatalogEntry],
    subcontractors: &[SubcontractorItem],
    custom_services: &[CustomServiceItem],
    date: NaiveDate,
) -> Invoice {
    let services: Vec<ServiceWithCost> = catalog
        .iter()
        .filter(|service| selected.is_selected(service.id))
        .map(|service| {
            let rate = service.rate.cents_per_lb();
            ServiceWithCost {
                id: service.id,
                name: service.name.clone(),
                rate,
                cost: (job.vehicle_weight as f64 * rate) / 100.0,
            }
        })
        .collect();

    let subtotal: f64 = services.iter().map(|s| s.cost).sum();
    let custom_services_total: f64 = custom_services.iter().map(|c| c.price.value()).sum();
    let subcontractor_total: f64 = subcontractors.iter().map(|s| s.price.value()).sum();
    let fuel_surcharge_amount = (subtotal + custom_services_total) * (job.fuel_surcharge / 100.0);
    let total = subtotal + custom_services_total + subcontractor_total + fuel_surcharge_amount;

    Invoice {
        job: job.clone(),
        services,
        custom_services: custom_services.to_vec(),
        subcontractors: subcontractors.to_vec(),
        subtotal,
        custom_services_total,
        subcontractor_total,
        fuel_surcharge_amount,
        total,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_catalog, Rate};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.005
    }

    fn job(weight: i64, surcharge: f64) -> JobInfo {
        JobInfo {
            customer_name: "Acme Freight".to_string(),
            invoice_number: "1001".to_string(),
            vehicle_type: "Tractor trailer".to_string(),
            vehicle_weight: weight,
            problem_description: "Off the road".to_string(),
            fuel_surcharge: surcharge,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_single_service_with_surcharge() {
        let catalog = vec![ServiceCatalogEntry::new(1, "Normal Recovery", 4.0)];
        let invoice = calculate_invoice_on(
            &job(10000, 15.0),
            &SelectedServices::from_ids([1]),
            &catalog,
            &[],
            &[],
            day(),
        );
        assert_eq!(invoice.services.len(), 1);
        assert!(close(invoice.services[0].cost, 400.0));
        assert!(close(invoice.subtotal, 400.0));
        assert!(close(invoice.fuel_surcharge_amount, 60.0));
        assert!(close(invoice.total, 460.0));
        assert_eq!(invoice.date, day());
    }

    #[test]
    fn test_custom_services_and_subcontractors() {
        let catalog = vec![
            ServiceCatalogEntry::new(1, "Normal Recovery", 4.0),
            ServiceCatalogEntry::new(2, "Salvage/Debris Recovery", 5.5),
        ];
        let invoice = calculate_invoice_on(
            &job(5000, 10.0),
            &SelectedServices::from_ids([1, 2]),
            &catalog,
            &[SubcontractorItem::new("Crane Co", "Lifted cab", 100.0)],
            &[CustomServiceItem::new("Road cleanup", 50.0)],
            day(),
        );
        assert!(close(invoice.services[0].cost, 200.0));
        assert!(close(invoice.services[1].cost, 275.0));
        assert!(close(invoice.subtotal, 475.0));
        assert!(close(invoice.custom_services_total, 50.0));
        assert!(close(invoice.subcontractor_total, 100.0));
        assert!(close(invoice.fuel_surcharge_amount, 52.5));
        assert!(close(invoice.total, 677.5));
    }

    #[test]
    fn test_subcontractors_do_not_change_surcharge() {
        let catalog = default_catalog();
        let selection = SelectedServices::from_ids([1, 7]);
        let without = calculate_invoice_on(&job(8000, 20.0), &selection, &catalog, &[], &[], day());
        let with = calculate_invoice_on(
            &job(8000, 20.0),
            &selection,
            &catalog,
            &[SubcontractorItem::new("Sub", "Work", 999.0)],
            &[],
            day(),
        );
        assert_eq!(without.fuel_surcharge_amount, with.fuel_surcharge_amount);
        assert!(close(with.total - without.total, 999.0));
    }

    #[test]
    fn test_totals_hold_for_whole_catalog() {
        let catalog = default_catalog();
        let selection: SelectedServices = catalog.iter().map(|s| (s.id, s.id % 2 == 0)).collect();
        let info = job(12345, 17.5);
        let custom = [CustomServiceItem::new("Cleanup", 75.25)];
        let subs = [SubcontractorItem::new("Rotator", "Uprighted", 310.0)];
        let invoice = calculate_invoice_on(&info, &selection, &catalog, &subs, &custom, day());

        let expected_subtotal: f64 = catalog
            .iter()
            .filter(|s| s.id % 2 == 0)
            .map(|s| 12345.0 * s.rate.cents_per_lb() / 100.0)
            .sum();
        assert!(close(invoice.subtotal, expected_subtotal));
        assert!(close(
            invoice.fuel_surcharge_amount,
            (invoice.subtotal + invoice.custom_services_total) * 17.5 / 100.0
        ));
        assert!(close(
            invoice.total,
            invoice.subtotal
                + invoice.custom_services_total
                + invoice.subcontractor_total
                + invoice.fuel_surcharge_amount
        ));
    }

    #[test]
    fn test_empty_selection() {
        let invoice = calculate_invoice_on(
            &job(10000, 15.0),
            &SelectedServices::new(),
            &default_catalog(),
            &[SubcontractorItem::new("Sub", "Work", 120.0)],
            &[],
            day(),
        );
        assert!(invoice.services.is_empty());
        assert_eq!(invoice.subtotal, 0.0);
        assert_eq!(invoice.fuel_surcharge_amount, 0.0);
        assert_eq!(invoice.total, 120.0);
    }

    #[test]
    fn test_unknown_and_unselected_ids_are_ignored() {
        let catalog = default_catalog();
        let mut selection = SelectedServices::from_ids([1, 404]);
        selection.set(2, false);
        let invoice = calculate_invoice_on(&job(1000, 0.0), &selection, &catalog, &[], &[], day());
        assert_eq!(invoice.services.len(), 1);
        assert_eq!(invoice.services[0].id, 1);
        assert!(close(invoice.subtotal, 40.0));
    }

    #[test]
    fn test_text_rates_are_coerced() {
        let numeric = vec![ServiceCatalogEntry::new(3, "Salvage", 5.5)];
        let text = vec![ServiceCatalogEntry::new(3, "Salvage", "5.5")];
        let selection = SelectedServices::from_ids([3]);
        let a = calculate_invoice_on(&job(2000, 15.0), &selection, &numeric, &[], &[], day());
        let b = calculate_invoice_on(&job(2000, 15.0), &selection, &text, &[], &[], day());
        assert_eq!(a.total, b.total);
        assert_eq!(b.services[0].rate, 5.5);
    }

    #[test]
    fn test_bad_rate_propagates_nan() {
        let catalog = vec![ServiceCatalogEntry {
            id: 1,
            name: "Broken".to_string(),
            rate: Rate::Text("n/a".to_string()),
        }];
        let invoice = calculate_invoice_on(
            &job(1000, 15.0),
            &SelectedServices::from_ids([1]),
            &catalog,
            &[],
            &[],
            day(),
        );
        assert!(invoice.subtotal.is_nan());
        assert!(invoice.total.is_nan());
    }

    #[test]
    fn test_negative_weight_is_not_special() {
        let catalog = vec![ServiceCatalogEntry::new(1, "Normal Recovery", 4.0)];
        let invoice = calculate_invoice_on(
            &job(-500, 0.0),
            &SelectedServices::from_ids([1]),
            &catalog,
            &[],
            &[],
            day(),
        );
        assert!(close(invoice.subtotal, -20.0));
    }

    #[test]
    fn test_same_inputs_same_invoice() {
        let catalog = default_catalog();
        let selection = SelectedServices::from_ids([2, 5, 9]);
        let custom = [CustomServiceItem::new("Cleanup", 40.0)];
        let a = calculate_invoice_on(&job(7000, 15.0), &selection, &catalog, &[], &custom, day());
        let b = calculate_invoice_on(&job(7000, 15.0), &selection, &catalog, &[], &custom, day());
        assert_eq!(a, b);
    }

    #[test]
    fn test_dated_today() {
        let invoice = calculate_invoice(
            &job(1000, 15.0),
            &SelectedServices::new(),
            &default_catalog(),
            &[],
            &[],
        );
        let today = Local::now().date_naive();
        // Allow for the test running across midnight.
        assert!(invoice.date == today || invoice.date.succ_opt() == Some(today));
    }
}
