//! The `calc` command and the invoice output shared with `jobs show`.

use crate::args::{CalcArgs, OutputFormat};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{validate, Amount, CompanySettings, Invoice, InvoiceRequest, JobPhoto};
use crate::{render, utils, Config, Result};
use anyhow::Context;
use std::path::Path;

/// Computes an invoice from the JSON file at `args.input`.
///
/// The request is priced against its own `services` catalog when it has one and against the
/// stored catalog otherwise. Unlike `POST /api/invoices/calculate` this refuses requests that have
/// no selected service or no vehicle weight, since the point is to produce a document.
///
/// # Errors
/// - Returns an error if the input cannot be read or parsed.
/// - Returns a validation error if the request is not ready to be invoiced.
/// - Returns an error if `args.user` does not exist or the output cannot be written.
pub async fn calc(config: Config, args: CalcArgs) -> Result<Out<Invoice>> {
    let content = utils::read(&args.input).await.pub_result(ErrorType::Io)?;
    let request: InvoiceRequest = serde_json::from_str(&content)
        .with_context(|| format!("Unable to parse the invoice request {}", args.input.display()))
        .pub_result(ErrorType::Validation)?;

    let catalog = match &request.services {
        Some(services) => services.clone(),
        None => config.db().list_services().await?,
    };
    validate::ready_for_invoice(&request.job, &request.selected_services, &catalog)?;
    let invoice = request.calculate(&catalog);

    let settings = match &args.user {
        Some(username) => {
            let user = config.db().get_user_by_username(username).await?;
            config.db().get_company_settings(user.id).await?
        }
        None => CompanySettings::default(),
    };
    let document = render_invoice(&invoice, args.format, &settings, &[], config.date_format())?;
    let message = deliver(&invoice, document, args.output.as_deref()).await?;
    Ok(Out::new(message, invoice))
}

/// Formats `invoice` as the requested document.
pub(super) fn render_invoice(
    invoice: &Invoice,
    format: OutputFormat,
    settings: &CompanySettings,
    photos: &[JobPhoto],
    date_format: &str,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render::text_document(invoice, settings, date_format),
        OutputFormat::Json => {
            serde_json::to_string_pretty(invoice).context("Unable to serialize the invoice")?
        }
        OutputFormat::Html => render::html_document(invoice, settings, photos, date_format)?,
        OutputFormat::Share => render::share_text(invoice),
    })
}

/// Writes `document` to `output`, or to stdout when there is no output file.
pub(super) async fn deliver(
    invoice: &Invoice,
    document: String,
    output: Option<&Path>,
) -> Result<String> {
    match output {
        Some(path) => {
            utils::write(path, document)
                .await
                .pub_result(ErrorType::Io)?;
            Ok(format!(
                "Wrote invoice #{} to {}",
                invoice.job.invoice_number,
                path.display()
            ))
        }
        None => {
            println!("{document}");
            Ok(format!(
                "Invoice #{} total {}",
                invoice.job.invoice_number,
                Amount::new(invoice.total)
            ))
        }
    }
}
