//! Job commands. The CLI acts as the local system and sees every job.

use super::calc::{deliver, render_invoice};
use crate::args::JobsShowArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{format_count, Invoice, Job, Viewer};
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use tracing::warn;

/// Lists saved jobs, newest first. Only the `recent` newest jobs are listed when it is given.
pub async fn jobs_list(config: Config, recent: Option<u32>) -> Result<Out<Vec<Job>>> {
    let jobs = match recent {
        Some(limit) => config.db().recent_jobs(&Viewer::System, limit).await?,
        None => config.db().list_jobs(&Viewer::System).await?,
    };
    let mut message = format!("{} jobs", jobs.len());
    for job in &jobs {
        let _ = write!(
            message,
            "\n{:>5}  #{:<10}  {:<24}  {:>8} lbs  {}",
            job.id,
            job.info.invoice_number,
            job.info.customer_name,
            format_count(job.info.vehicle_weight),
            job.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(Out::new(message, jobs))
}

/// Prints or writes the invoice of a saved job, branded with the settings of the user that created
/// it.
pub async fn jobs_show(config: Config, args: JobsShowArgs) -> Result<Out<Invoice>> {
    let detail = config.db().get_job(args.id).await?;
    let settings = match detail.job.user_id {
        Some(owner) => config.db().get_company_settings(owner).await?,
        None => Default::default(),
    };
    let invoice = detail.invoice();
    let document = render_invoice(
        &invoice,
        args.format,
        &settings,
        &detail.photos,
        config.date_format(),
    )?;
    let message = deliver(&invoice, document, args.output.as_deref()).await?;
    Ok(Out::new(message, invoice))
}

/// Deletes a job along with its line items, service records, photo records and photo files.
pub async fn jobs_delete(config: Config, id: i64) -> Result<Out<i64>> {
    let files = config.db().photo_files(id).await?;
    config.db().delete_job(id).await?;
    for file in files {
        if let Err(e) = utils::remove_file(config.uploads().join(&file)).await {
            warn!("Unable to remove photo {file} of deleted job {id}: {e:#}");
        }
    }
    Ok(Out::new(format!("Deleted job {id}"), id))
}

/// One line of the jobs export.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: i64,
    invoice_number: &'a str,
    customer_name: &'a str,
    vehicle_type: &'a str,
    vehicle_weight: i64,
    fuel_surcharge: f64,
    subtotal: String,
    total: String,
    created_at: String,
}

/// Writes every job with its computed totals to a CSV file at `output`.
pub async fn jobs_export(config: Config, output: &Path) -> Result<Out<usize>> {
    let jobs = config.db().list_jobs(&Viewer::System).await?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    for job in &jobs {
        let invoice = config.db().get_job(job.id).await?.invoice();
        writer
            .serialize(ExportRow {
                id: job.id,
                invoice_number: &job.info.invoice_number,
                customer_name: &job.info.customer_name,
                vehicle_type: &job.info.vehicle_type,
                vehicle_weight: job.info.vehicle_weight,
                fuel_surcharge: job.info.fuel_surcharge,
                subtotal: format!("{:.2}", invoice.subtotal),
                total: format!("{:.2}", invoice.total),
                created_at: job.created_at.to_rfc3339(),
            })
            .with_context(|| format!("Unable to export job {}", job.id))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Unable to finish the CSV export")?;
    utils::write(output, bytes).await.pub_result(ErrorType::Io)?;
    Ok(Out::new(
        format!("Exported {} jobs to {}", jobs.len(), output.display()),
        jobs.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OutputFormat;
    use crate::calc::calculate_invoice;
    use crate::error::error_type;
    use crate::model::SelectedServices;
    use crate::test::{job_info, TestEnv};
    use tempfile::TempDir;

    async fn saved_job(env: &TestEnv, invoice_number: &str) -> i64 {
        let catalog = env.db().list_services().await.unwrap();
        let invoice = calculate_invoice(
            &job_info(invoice_number, 10000),
            &SelectedServices::from_ids([1]),
            &catalog,
            &[],
            &[],
        );
        env.db().save_invoice(None, &invoice).await.unwrap().job.id
    }

    #[tokio::test]
    async fn test_list_and_show() {
        let env = TestEnv::new().await;
        saved_job(&env, "1001").await;
        let id = saved_job(&env, "1002").await;

        let out = jobs_list(env.config(), None).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
        let out = jobs_list(env.config(), Some(1)).await.unwrap();
        assert_eq!(out.structure().unwrap()[0].id, id);
        assert!(out.message().contains("#1002"));

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("invoice.txt");
        let args = JobsShowArgs {
            id,
            format: OutputFormat::Share,
            output: Some(output.clone()),
        };
        let out = jobs_show(env.config(), args).await.unwrap();
        assert!((out.structure().unwrap().total - 460.0).abs() < 1e-9);
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "Invoice #1002\nCustomer: Acme Freight\nTotal: $460.00"
        );
    }

    #[tokio::test]
    async fn test_export_and_delete() {
        let env = TestEnv::new().await;
        let id = saved_job(&env, "1001").await;
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("jobs.csv");

        let out = jobs_export(env.config(), &output).await.unwrap();
        assert_eq!(out.structure(), Some(&1));
        let csv = std::fs::read_to_string(&output).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,invoice_number,customer_name,vehicle_type,vehicle_weight,fuel_surcharge,\
             subtotal,total,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("{id},1001,Acme Freight,Tractor trailer,10000,15.0,")));
        assert!(row.contains(",400.00,460.00,"));

        jobs_delete(env.config(), id).await.unwrap();
        let e = jobs_delete(env.config(), id).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::NotFound));
    }
}
