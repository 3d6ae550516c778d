//! Turns an [`Invoice`] into something a person reads: a one-line share summary, a plain text
//! document or a self-contained printable HTML page.

use crate::model::{format_count, Amount, CompanySettings, Invoice, JobPhoto};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::{self, Write};
use tera::Tera;

const INVOICE_TEMPLATE: &str = include_str!("../templates/invoice.html.tera");
const INVOICE_TEMPLATE_NAME: &str = "invoice.html";

/// The short summary used when an invoice is shared as text, e.g.
///
/// ```text
/// Invoice #1001
/// Customer: Acme Freight
/// Total: $460.00
/// ```
pub fn share_text(invoice: &Invoice) -> String {
    format!(
        "Invoice #{}\nCustomer: {}\nTotal: ${:.2}",
        invoice.job.invoice_number, invoice.job.customer_name, invoice.total
    )
}

fn money(value: f64) -> String {
    Amount::new(value).to_string()
}

fn rate(value: f64) -> String {
    format!("{value:.1}¢/lb")
}

fn contact_lines(settings: &CompanySettings) -> Vec<String> {
    [&settings.address, &settings.phone, &settings.email]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect()
}

/// A detailed plain text invoice.
pub fn text_document(invoice: &Invoice, settings: &CompanySettings, date_format: &str) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    write_text_document(&mut out, invoice, settings, date_format).unwrap_or_default();
    out
}

fn write_text_document(
    out: &mut String,
    invoice: &Invoice,
    settings: &CompanySettings,
    date_format: &str,
) -> fmt::Result {
    let job = &invoice.job;
    writeln!(out, "{}", settings.company_name)?;
    writeln!(out, "{}", settings.company_subtitle)?;
    for line in contact_lines(settings) {
        writeln!(out, "{line}")?;
    }
    writeln!(out)?;
    writeln!(out, "INVOICE #{}", job.invoice_number)?;
    writeln!(out, "Date: {}", invoice.date.format(date_format))?;
    writeln!(out, "Customer: {}", job.customer_name)?;
    writeln!(out, "Vehicle: {}", job.vehicle_type)?;
    writeln!(out, "Weight: {} lbs", format_count(job.vehicle_weight))?;
    writeln!(out, "Problem: {}", job.problem_description)?;
    writeln!(out)?;

    writeln!(out, "Services Provided")?;
    for service in &invoice.services {
        writeln!(
            out,
            "  {:<44} {:>10} {:>12}",
            service.name,
            rate(service.rate),
            money(service.cost)
        )?;
    }
    if !invoice.custom_services.is_empty() {
        writeln!(out)?;
        writeln!(out, "Additional Services")?;
        for item in &invoice.custom_services {
            writeln!(out, "  {:<55} {:>12}", item.name, item.price.to_string())?;
        }
    }
    if !invoice.subcontractors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Subcontractors")?;
        for item in &invoice.subcontractors {
            let name = if item.work_performed.trim().is_empty() {
                item.name.clone()
            } else {
                format!("{} - {}", item.name, item.work_performed)
            };
            writeln!(out, "  {:<55} {:>12}", name, item.price.to_string())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{:<57} {:>12}", "Subtotal:", money(invoice.subtotal))?;
    if !invoice.custom_services.is_empty() {
        writeln!(
            out,
            "{:<57} {:>12}",
            "Additional Services:",
            money(invoice.custom_services_total)
        )?;
    }
    writeln!(
        out,
        "{:<57} {:>12}",
        format!("Fuel Surcharge ({}%):", job.fuel_surcharge),
        money(invoice.fuel_surcharge_amount)
    )?;
    if !invoice.subcontractors.is_empty() {
        writeln!(
            out,
            "{:<57} {:>12}",
            "Subcontractors:",
            money(invoice.subcontractor_total)
        )?;
    }
    writeln!(out, "{:<57} {:>12}", "Total:", money(invoice.total))?;

    let footer: Vec<&str> = settings.footer_lines().collect();
    if !footer.is_empty() {
        writeln!(out)?;
        for line in footer {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ServiceLine {
    name: String,
    rate: String,
    cost: String,
}

#[derive(Serialize)]
struct CustomLine {
    name: String,
    price: String,
}

#[derive(Serialize)]
struct SubcontractorLine {
    name: String,
    work_performed: String,
    price: String,
}

/// Everything the HTML template needs, already formatted.
#[derive(Serialize)]
struct DocumentContext {
    logo: String,
    logo_is_image: bool,
    company_name: String,
    company_subtitle: String,
    contact: Vec<String>,
    invoice_number: String,
    date: String,
    customer_name: String,
    vehicle_type: String,
    vehicle_weight: String,
    problem_description: String,
    services: Vec<ServiceLine>,
    custom_services: Vec<CustomLine>,
    subcontractors: Vec<SubcontractorLine>,
    photos: Vec<String>,
    subtotal: String,
    custom_services_total: String,
    fuel_surcharge: String,
    fuel_surcharge_amount: String,
    subcontractor_total: String,
    total: String,
    footer: Vec<String>,
}

impl DocumentContext {
    fn new(
        invoice: &Invoice,
        settings: &CompanySettings,
        photos: &[JobPhoto],
        date_format: &str,
    ) -> Self {
        let job = &invoice.job;
        Self {
            logo: settings.company_logo.clone(),
            logo_is_image: settings.logo_is_image(),
            company_name: settings.company_name.clone(),
            company_subtitle: settings.company_subtitle.clone(),
            contact: contact_lines(settings),
            invoice_number: job.invoice_number.clone(),
            date: invoice.date.format(date_format).to_string(),
            customer_name: job.customer_name.clone(),
            vehicle_type: job.vehicle_type.clone(),
            vehicle_weight: format_count(job.vehicle_weight),
            problem_description: job.problem_description.clone(),
            services: invoice
                .services
                .iter()
                .map(|s| ServiceLine {
                    name: s.name.clone(),
                    rate: rate(s.rate),
                    cost: money(s.cost),
                })
                .collect(),
            custom_services: invoice
                .custom_services
                .iter()
                .map(|c| CustomLine {
                    name: c.name.clone(),
                    price: c.price.to_string(),
                })
                .collect(),
            subcontractors: invoice
                .subcontractors
                .iter()
                .map(|s| SubcontractorLine {
                    name: s.name.clone(),
                    work_performed: s.work_performed.clone(),
                    price: s.price.to_string(),
                })
                .collect(),
            photos: photos.iter().map(|p| p.photo_path.clone()).collect(),
            subtotal: money(invoice.subtotal),
            custom_services_total: money(invoice.custom_services_total),
            fuel_surcharge: job.fuel_surcharge.to_string(),
            fuel_surcharge_amount: money(invoice.fuel_surcharge_amount),
            subcontractor_total: money(invoice.subcontractor_total),
            total: money(invoice.total),
            footer: settings.footer_lines().map(str::to_string).collect(),
        }
    }
}

/// A printable, self-contained HTML invoice with inline styles.
pub fn html_document(
    invoice: &Invoice,
    settings: &CompanySettings,
    photos: &[JobPhoto],
    date_format: &str,
) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(INVOICE_TEMPLATE_NAME, INVOICE_TEMPLATE)
        .context("Unable to parse the invoice template")?;
    let context = tera::Context::from_serialize(DocumentContext::new(
        invoice,
        settings,
        photos,
        date_format,
    ))
    .context("Unable to build the invoice template context")?;
    tera.render(INVOICE_TEMPLATE_NAME, &context)
        .context("Unable to render the invoice")
}
