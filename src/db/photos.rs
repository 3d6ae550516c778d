//! Photo records. The files themselves live in the uploads directory.

use super::Db;
use crate::error::{not_found, IntoResult};
use crate::model::JobPhoto;
use crate::{ErrorType, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(sqlx::FromRow)]
struct PhotoRow {
    id: i64,
    job_id: i64,
    photo_path: String,
    original_name: String,
    created_at: DateTime<Utc>,
}

impl From<PhotoRow> for JobPhoto {
    fn from(row: PhotoRow) -> Self {
        JobPhoto {
            id: row.id,
            job_id: row.job_id,
            photo_path: row.photo_path,
            original_name: row.original_name,
            created_at: row.created_at,
        }
    }
}

impl Db {
    /// Records a photo stored at `file_name` (relative to the uploads directory) and served at
    /// `photo_path`.
    pub(crate) async fn add_photo(
        &self,
        job_id: i64,
        photo_path: &str,
        file_name: &str,
        original_name: &str,
    ) -> Result<JobPhoto> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO job_photos (job_id, photo_path, file_name, original_name, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(job_id)
        .bind(photo_path)
        .bind(file_name)
        .bind(original_name)
        .bind(created_at)
        .execute(self.pool())
        .await
        .context("Failed to add photo")
        .pub_result(ErrorType::Database)?;
        debug!("Added photo {file_name} to job {job_id}");
        Ok(JobPhoto {
            id: result.last_insert_rowid(),
            job_id,
            photo_path: photo_path.to_string(),
            original_name: original_name.to_string(),
            created_at,
        })
    }

    pub(crate) async fn list_photos(&self, job_id: i64) -> Result<Vec<JobPhoto>> {
        let rows: Vec<PhotoRow> = sqlx::query_as(
            "SELECT id, job_id, photo_path, original_name, created_at \
             FROM job_photos WHERE job_id = ? ORDER BY id",
        )
        .bind(job_id)
        .fetch_all(self.pool())
        .await
        .context("Failed to list photos")
        .pub_result(ErrorType::Database)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub(crate) async fn get_photo(&self, job_id: i64, photo_id: i64) -> Result<JobPhoto> {
        let row: Option<PhotoRow> = sqlx::query_as(
            "SELECT id, job_id, photo_path, original_name, created_at \
             FROM job_photos WHERE id = ? AND job_id = ?",
        )
        .bind(photo_id)
        .bind(job_id)
        .fetch_optional(self.pool())
        .await
        .context("Failed to get photo")
        .pub_result(ErrorType::Database)?;
        row.map(Into::into)
            .ok_or_else(|| not_found(format!("Photo {photo_id} not found")))
    }

    /// Deletes the photo record and returns the stored file name so the caller can remove the
    /// file.
    pub(crate) async fn delete_photo(&self, job_id: i64, photo_id: i64) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as(
            "DELETE FROM job_photos WHERE id = ? AND job_id = ? RETURNING file_name",
        )
        .bind(photo_id)
        .bind(job_id)
        .fetch_optional(self.pool())
        .await
        .context("Failed to delete photo")
        .pub_result(ErrorType::Database)?;
        row.map(|(file_name,)| file_name)
            .ok_or_else(|| not_found(format!("Photo {photo_id} not found")))
    }

    /// Returns the stored file names of every photo of a job.
    pub(crate) async fn photo_files(&self, job_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT file_name FROM job_photos WHERE job_id = ? ORDER BY id")
                .bind(job_id)
                .fetch_all(self.pool())
                .await
                .context("Failed to list photo files")
                .pub_result(ErrorType::Database)?;
        Ok(rows.into_iter().map(|(f,)| f).collect())
    }
}
