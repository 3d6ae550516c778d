//! Jobs, their line items and the service costs saved with their invoices.

use super::{percent_from_text, percent_to_text, Db};
use crate::error::{not_found, IntoResult};
use crate::model::{
    validate, CustomServiceItem, Invoice, InvoiceServiceRecord, Job, JobDetail, JobInfo,
    NewInvoiceService, SubcontractorItem, Viewer,
};
use crate::{ErrorType, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::info;

const JOB_COLUMNS: &str = "id, user_id, customer_name, invoice_number, vehicle_type, \
     vehicle_weight, problem_description, fuel_surcharge, created_at";

/// Matches the jobs a viewer may see.
/// `?1` is 1 when the viewer sees everything, `?2` is the viewer's user id and `?3` their company.
const VISIBLE_TO_VIEWER: &str = "(?1 = 1 OR user_id = ?2 OR (?3 IS NOT NULL AND user_id IN \
     (SELECT id FROM users WHERE company_id = ?3)))";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    user_id: Option<i64>,
    customer_name: String,
    invoice_number: String,
    vehicle_type: String,
    vehicle_weight: i64,
    problem_description: String,
    fuel_surcharge: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = crate::Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Job {
            id: row.id,
            user_id: row.user_id,
            info: JobInfo {
                customer_name: row.customer_name,
                invoice_number: row.invoice_number,
                vehicle_type: row.vehicle_type,
                vehicle_weight: row.vehicle_weight,
                problem_description: row.problem_description,
                fuel_surcharge: percent_from_text(&row.fuel_surcharge)?,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceServiceRow {
    id: i64,
    job_id: i64,
    service_id: i64,
    service_name: String,
    rate: String,
    cost: f64,
}

impl From<InvoiceServiceRow> for InvoiceServiceRecord {
    fn from(row: InvoiceServiceRow) -> Self {
        InvoiceServiceRecord {
            id: row.id,
            job_id: row.job_id,
            service_id: row.service_id,
            service_name: row.service_name,
            rate: row.rate,
            cost: row.cost,
        }
    }
}

fn viewer_binds(viewer: &Viewer) -> (i64, Option<i64>, Option<i64>) {
    match viewer {
        Viewer::System => (1, None, None),
        Viewer::User { id, company_id, .. } => {
            (i64::from(viewer.sees_everything()), Some(*id), *company_id)
        }
    }
}

impl Db {
    /// Validates and stores a job together with its custom services and subcontractors.
    pub(crate) async fn create_job(
        &self,
        user_id: Option<i64>,
        info: &JobInfo,
        custom_services: &[CustomServiceItem],
        subcontractors: &[SubcontractorItem],
    ) -> Result<Job> {
        validate::job_info(info)?;
        validate::line_items(custom_services, subcontractors)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")
            .pub_result(ErrorType::Database)?;
        let job = insert_job(&mut tx, user_id, info, custom_services, subcontractors).await?;
        tx.commit()
            .await
            .context("Failed to commit job")
            .pub_result(ErrorType::Database)?;
        info!(
            "Created job {} for invoice #{}",
            job.id, job.info.invoice_number
        );
        Ok(job)
    }

    /// Stores a computed invoice: the job, its line items and the cost of every selected
    /// service, all in one transaction.
    pub(crate) async fn save_invoice(
        &self,
        user_id: Option<i64>,
        invoice: &Invoice,
    ) -> Result<JobDetail> {
        validate::job_info(&invoice.job)?;
        validate::line_items(&invoice.custom_services, &invoice.subcontractors)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")
            .pub_result(ErrorType::Database)?;
        let job = insert_job(
            &mut tx,
            user_id,
            &invoice.job,
            &invoice.custom_services,
            &invoice.subcontractors,
        )
        .await?;
        insert_invoice_services(&mut tx, job.id, &invoice.service_records()).await?;
        tx.commit()
            .await
            .context("Failed to commit invoice")
            .pub_result(ErrorType::Database)?;
        info!(
            "Saved invoice #{} as job {} with {} services",
            invoice.job.invoice_number,
            job.id,
            invoice.services.len()
        );
        self.get_job(job.id).await
    }

    /// Returns a job with everything stored for it.
    pub(crate) async fn get_job(&self, id: i64) -> Result<JobDetail> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .context("Failed to get job")
                .pub_result(ErrorType::Database)?;
        let job: Job = row
            .ok_or_else(|| not_found(format!("Job {id} not found")))?
            .try_into()?;

        let invoice_services: Vec<InvoiceServiceRow> = sqlx::query_as(
            "SELECT id, job_id, service_id, service_name, rate, cost \
             FROM invoice_services WHERE job_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .context("Failed to get invoice services")
        .pub_result(ErrorType::Database)?;

        let custom: Vec<(String, f64)> = sqlx::query_as(
            "SELECT name, price FROM job_custom_services WHERE job_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .context("Failed to get custom services")
        .pub_result(ErrorType::Database)?;

        let subs: Vec<(String, String, f64)> = sqlx::query_as(
            "SELECT name, work_performed, price FROM job_subcontractors \
             WHERE job_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .context("Failed to get subcontractors")
        .pub_result(ErrorType::Database)?;

        let photos = self.list_photos(id).await?;

        Ok(JobDetail {
            job,
            invoice_services: invoice_services.into_iter().map(Into::into).collect(),
            custom_services: custom
                .into_iter()
                .map(|(name, price)| CustomServiceItem::new(name, price))
                .collect(),
            subcontractors: subs
                .into_iter()
                .map(|(name, work, price)| SubcontractorItem::new(name, work, price))
                .collect(),
            photos,
        })
    }

    /// Returns every job the viewer may see, newest first.
    pub(crate) async fn list_jobs(&self, viewer: &Viewer) -> Result<Vec<Job>> {
        self.query_jobs(viewer, None).await
    }

    /// Returns the viewer's `limit` newest jobs.
    pub(crate) async fn recent_jobs(&self, viewer: &Viewer, limit: u32) -> Result<Vec<Job>> {
        self.query_jobs(viewer, Some(limit)).await
    }

    async fn query_jobs(&self, viewer: &Viewer, limit: Option<u32>) -> Result<Vec<Job>> {
        let (all, user_id, company_id) = viewer_binds(viewer);
        // SQLite treats a negative limit as no limit.
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE {VISIBLE_TO_VIEWER} \
             ORDER BY created_at DESC, id DESC LIMIT ?4"
        ))
        .bind(all)
        .bind(user_id)
        .bind(company_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .context("Failed to list jobs")
        .pub_result(ErrorType::Database)?;
        rows.into_iter().map(Job::try_from).collect()
    }

    /// Whether the viewer may see the job. Returns a not-found error when the job does not exist.
    pub(crate) async fn can_view_job(&self, viewer: &Viewer, job_id: i64) -> Result<bool> {
        let (all, user_id, company_id) = viewer_binds(viewer);
        let row: Option<(i64, i64)> = sqlx::query_as(&format!(
            "SELECT id, {VISIBLE_TO_VIEWER} FROM jobs WHERE id = ?4"
        ))
        .bind(all)
        .bind(user_id)
        .bind(company_id)
        .bind(job_id)
        .fetch_optional(self.pool())
        .await
        .context("Failed to check job access")
        .pub_result(ErrorType::Database)?;
        match row {
            Some((_, visible)) => Ok(visible != 0),
            None => Err(not_found(format!("Job {job_id} not found"))),
        }
    }

    /// Deletes a job and everything stored for it. Photo files are not touched.
    pub(crate) async fn delete_job(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to delete job")
            .pub_result(ErrorType::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("Job {id} not found")));
        }
        info!("Deleted job {id}");
        Ok(())
    }

    /// Stores selected service costs for an existing job.
    pub(crate) async fn create_invoice_services(
        &self,
        job_id: i64,
        services: &[NewInvoiceService],
    ) -> Result<Vec<InvoiceServiceRecord>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")
            .pub_result(ErrorType::Database)?;
        let (exists,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check job")
            .pub_result(ErrorType::Database)?;
        if exists == 0 {
            return Err(not_found(format!("Job {job_id} not found")));
        }
        let records = insert_invoice_services(&mut tx, job_id, services).await?;
        tx.commit()
            .await
            .context("Failed to commit invoice services")
            .pub_result(ErrorType::Database)?;
        Ok(records)
    }
}

async fn insert_job(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: Option<i64>,
    info: &JobInfo,
    custom_services: &[CustomServiceItem],
    subcontractors: &[SubcontractorItem],
) -> Result<Job> {
    let created_at = Utc::now();
    let result = sqlx::query(
        "INSERT INTO jobs (user_id, customer_name, invoice_number, vehicle_type, vehicle_weight, \
         problem_description, fuel_surcharge, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(info.customer_name.trim())
    .bind(info.invoice_number.trim())
    .bind(info.vehicle_type.trim())
    .bind(info.vehicle_weight)
    .bind(info.problem_description.trim())
    .bind(percent_to_text(info.fuel_surcharge)?)
    .bind(created_at)
    .execute(&mut **tx)
    .await
    .context("Failed to insert job")
    .pub_result(ErrorType::Database)?;
    let id = result.last_insert_rowid();

    for (position, item) in custom_services.iter().enumerate() {
        sqlx::query(
            "INSERT INTO job_custom_services (job_id, position, name, price) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(position as i64)
        .bind(item.name.trim())
        .bind(item.price.value())
        .execute(&mut **tx)
        .await
        .context("Failed to insert custom service")
        .pub_result(ErrorType::Database)?;
    }
    for (position, item) in subcontractors.iter().enumerate() {
        sqlx::query(
            "INSERT INTO job_subcontractors (job_id, position, name, work_performed, price) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(position as i64)
        .bind(item.name.trim())
        .bind(&item.work_performed)
        .bind(item.price.value())
        .execute(&mut **tx)
        .await
        .context("Failed to insert subcontractor")
        .pub_result(ErrorType::Database)?;
    }

    Ok(Job {
        id,
        user_id,
        info: JobInfo {
            customer_name: info.customer_name.trim().to_string(),
            invoice_number: info.invoice_number.trim().to_string(),
            vehicle_type: info.vehicle_type.trim().to_string(),
            problem_description: info.problem_description.trim().to_string(),
            // Read back the way it is stored so the returned job matches a later `get_job`.
            fuel_surcharge: percent_from_text(&percent_to_text(info.fuel_surcharge)?)?,
            ..info.clone()
        },
        created_at,
    })
}

async fn insert_invoice_services(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
    services: &[NewInvoiceService],
) -> Result<Vec<InvoiceServiceRecord>> {
    let mut records = Vec::with_capacity(services.len());
    for service in services {
        let result = sqlx::query(
            "INSERT INTO invoice_services (job_id, service_id, service_name, rate, cost) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(job_id)
        .bind(service.service_id)
        .bind(&service.service_name)
        .bind(&service.rate)
        .bind(service.cost)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to store service {}", service.service_id))
        .pub_result(ErrorType::Database)?;
        records.push(InvoiceServiceRecord {
            id: result.last_insert_rowid(),
            job_id,
            service_id: service.service_id,
            service_name: service.service_name.clone(),
            rate: service.rate.clone(),
            cost: service.cost,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::calculate_invoice;
    use crate::error::error_type;
    use crate::model::{Role, SelectedServices};
    use crate::test::{job_info, TestEnv};

    #[tokio::test]
    async fn test_create_and_get_job() {
        let env = TestEnv::new().await;
        let db = env.db();
        let user = env.user("dispatch").await;
        let job = db
            .create_job(
                Some(user.id),
                &job_info("1001", 10000),
                &[CustomServiceItem::new("Cleanup", 50.0)],
                &[SubcontractorItem::new("Crane Co", "Lifted cab", 100.0)],
            )
            .await
            .unwrap();

        let detail = db.get_job(job.id).await.unwrap();
        assert_eq!(detail.job, job);
        assert_eq!(detail.custom_services.len(), 1);
        assert_eq!(detail.subcontractors[0].work_performed, "Lifted cab");
        assert!(detail.invoice_services.is_empty());
        assert!(detail.photos.is_empty());
    }

    #[tokio::test]
    async fn test_create_job_validates() {
        let env = TestEnv::new().await;
        let mut info = job_info("1001", 0);
        let e = env.db().create_job(None, &info, &[], &[]).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
        info.vehicle_weight = 100;
        info.customer_name = String::new();
        assert!(env.db().create_job(None, &info, &[], &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_save_invoice_snapshots_rates() {
        let env = TestEnv::new().await;
        let db = env.db();
        let catalog = db.list_services().await.unwrap();
        let invoice = calculate_invoice(
            &job_info("1002", 5000),
            &SelectedServices::from_ids([1, 3]),
            &catalog,
            &[SubcontractorItem::new("Crane Co", "Lift", 100.0)],
            &[CustomServiceItem::new("Cleanup", 50.0)],
        );
        let detail = db.save_invoice(None, &invoice).await.unwrap();
        assert_eq!(detail.invoice_services.len(), 2);
        assert_eq!(detail.invoice_services[1].rate, "5.5");

        // Editing the catalog does not change a saved invoice
        db.update_service_rate(3, "9.0").await.unwrap();
        let rebuilt = db.get_job(detail.job.id).await.unwrap().invoice();
        assert_eq!(rebuilt.total, invoice.total);
        assert_eq!(rebuilt.services, invoice.services);
    }

    #[tokio::test]
    async fn test_visibility() {
        let env = TestEnv::new().await;
        let db = env.db();
        let company = db.create_company("Acme Towing").await.unwrap();
        let alice = env.user_in("alice", Some(company.id)).await;
        let bob = env.user_in("bob", Some(company.id)).await;
        let carol = env.user("carol").await;
        let admin = env.admin("boss").await;

        let a = db
            .create_job(Some(alice.id), &job_info("A", 1000), &[], &[])
            .await
            .unwrap();
        let c = db
            .create_job(Some(carol.id), &job_info("C", 1000), &[], &[])
            .await
            .unwrap();

        let ids = |jobs: Vec<Job>| jobs.into_iter().map(|j| j.id).collect::<Vec<_>>();
        assert_eq!(ids(db.list_jobs(&(&bob).into()).await.unwrap()), vec![a.id]);
        assert_eq!(ids(db.list_jobs(&(&carol).into()).await.unwrap()), vec![c.id]);
        assert_eq!(db.list_jobs(&(&admin).into()).await.unwrap().len(), 2);
        assert_eq!(db.list_jobs(&Viewer::System).await.unwrap().len(), 2);

        assert!(db.can_view_job(&(&bob).into(), a.id).await.unwrap());
        assert!(!db.can_view_job(&(&bob).into(), c.id).await.unwrap());
        assert!(db.can_view_job(&(&admin).into(), c.id).await.unwrap());
        let e = db.can_view_job(&(&bob).into(), 999).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::NotFound));

        // A user with no company sees only their own jobs even when others have no company
        let dave = env.user("dave").await;
        assert!(db.list_jobs(&(&dave).into()).await.unwrap().is_empty());
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_recent_jobs_newest_first() {
        let env = TestEnv::new().await;
        let db = env.db();
        for n in 1..=4 {
            db.create_job(None, &job_info(&n.to_string(), 1000), &[], &[])
                .await
                .unwrap();
        }
        let recent = db.recent_jobs(&Viewer::System, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].info.invoice_number, "4");
        assert_eq!(recent[1].info.invoice_number, "3");
    }

    #[tokio::test]
    async fn test_delete_job_cascades() {
        let env = TestEnv::new().await;
        let db = env.db();
        let job = db
            .create_job(
                None,
                &job_info("1", 1000),
                &[CustomServiceItem::new("Cleanup", 10.0)],
                &[],
            )
            .await
            .unwrap();
        db.create_invoice_services(
            job.id,
            &[NewInvoiceService {
                service_id: 1,
                service_name: "Normal Recovery (On or Near Highway)".to_string(),
                rate: "4.0".to_string(),
                cost: 40.0,
            }],
        )
        .await
        .unwrap();
        db.delete_job(job.id).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoice_services")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        let e = db.get_job(job.id).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::NotFound));
        assert!(db.delete_job(job.id).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_owner_keeps_job() {
        let env = TestEnv::new().await;
        let db = env.db();
        let user = env.user("dispatch").await;
        let job = db
            .create_job(Some(user.id), &job_info("1", 1000), &[], &[])
            .await
            .unwrap();
        db.delete_user(user.id).await.unwrap();
        assert_eq!(db.get_job(job.id).await.unwrap().job.user_id, None);
    }

    #[tokio::test]
    async fn test_invoice_services_for_missing_job() {
        let env = TestEnv::new().await;
        let e = env
            .db()
            .create_invoice_services(42, &[])
            .await
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::NotFound));
    }
}
