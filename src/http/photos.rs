//! Job photo uploads. Files are written below the uploads directory and served from `/uploads`.

use super::error::ApiResult;
use super::extract::{ApiPath, CurrentUser};
use super::jobs::ensure_visible;
use super::AppState;
use crate::error::{validation, IntoResult};
use crate::model::JobPhoto;
use crate::{utils, ErrorType, Result};
use anyhow::Context;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const PHOTOS_FIELD: &str = "photos";
const FALLBACK_EXTENSION: &str = "img";

/// An image read from a multipart body.
#[derive(Debug)]
pub(super) struct UploadedImage {
    original_name: String,
    extension: String,
    bytes: Vec<u8>,
}

/// Where an upload was written.
#[derive(Debug)]
pub(super) struct StoredUpload {
    /// The URL path, e.g. `/uploads/jobs/3/<uuid>.jpg`.
    pub(super) public_path: String,
    /// The path relative to the uploads directory, e.g. `jobs/3/<uuid>.jpg`.
    pub(super) file_name: String,
}

/// Picks a file extension for an upload. Only `image/*` content types are accepted.
fn image_extension(content_type: Option<&str>, original_name: &str) -> Option<String> {
    let subtype = content_type?.strip_prefix("image/")?;
    let known = match subtype {
        "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "heic" | "heif" => Some("heic"),
        _ => None,
    };
    if let Some(ext) = known {
        return Some(ext.to_string());
    }
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    Some(from_name.unwrap_or_else(|| FALLBACK_EXTENSION.to_string()))
}

/// Reads the next non-empty file part named `field`, skipping other parts. Returns `None` when the
/// body has no more parts.
pub(super) async fn next_image(
    multipart: &mut Multipart,
    field: &str,
    max_bytes: u64,
) -> Result<Option<UploadedImage>> {
    loop {
        let Some(mut part) = multipart
            .next_field()
            .await
            .context("Unable to read the upload")
            .pub_result(ErrorType::Validation)?
        else {
            return Ok(None);
        };
        if part.name() != Some(field) {
            continue;
        }
        let original_name = part.file_name().unwrap_or_default().to_string();
        let extension = image_extension(part.content_type(), &original_name).ok_or_else(|| {
            validation(format!("'{original_name}' is not an image"))
        })?;

        let mut bytes = Vec::new();
        while let Some(chunk) = part
            .chunk()
            .await
            .context("Unable to read the upload")
            .pub_result(ErrorType::Validation)?
        {
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                return Err(validation(format!(
                    "'{original_name}' is larger than the {max_bytes} byte limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            continue;
        }
        return Ok(Some(UploadedImage {
            original_name,
            extension,
            bytes,
        }));
    }
}

/// Writes `image` to `<uploads>/<dir>/<uuid>.<ext>`.
pub(super) async fn store_upload(
    uploads: &Path,
    dir: &str,
    image: &UploadedImage,
) -> Result<StoredUpload> {
    utils::make_dir(uploads.join(dir))
        .await
        .pub_result(ErrorType::Io)?;
    let file_name = format!("{dir}/{}.{}", Uuid::new_v4(), image.extension);
    utils::write(uploads.join(&file_name), &image.bytes)
        .await
        .pub_result(ErrorType::Io)?;
    Ok(StoredUpload {
        public_path: format!("/uploads/{file_name}"),
        file_name,
    })
}

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<JobPhoto>>> {
    ensure_visible(&state, &current, id).await?;
    Ok(Json(state.db().list_photos(id).await?))
}

/// Attaches every image in the `photos` field to the job.
pub(crate) async fn upload(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<JobPhoto>>)> {
    ensure_visible(&state, &current, id).await?;
    let limit = state.config().max_photos_per_job() as usize;
    let existing = state.db().list_photos(id).await?.len();

    let mut images = Vec::new();
    while let Some(image) =
        next_image(&mut multipart, PHOTOS_FIELD, state.config().max_upload_bytes()).await?
    {
        if existing + images.len() >= limit {
            return Err(validation(format!("A job can have at most {limit} photos")).into());
        }
        images.push(image);
    }
    if images.is_empty() {
        return Err(validation("No photos uploaded").into());
    }

    let dir = format!("jobs/{id}");
    let mut photos = Vec::with_capacity(images.len());
    for image in &images {
        let stored = store_upload(state.config().uploads(), &dir, image).await?;
        let photo = state
            .db()
            .add_photo(id, &stored.public_path, &stored.file_name, &image.original_name)
            .await?;
        photos.push(photo);
    }
    info!("Added {} photos to job {id}", photos.len());
    Ok((StatusCode::CREATED, Json(photos)))
}

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath((id, photo_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<JobPhoto>> {
    ensure_visible(&state, &current, id).await?;
    Ok(Json(state.db().get_photo(id, photo_id).await?))
}

pub(crate) async fn remove(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath((id, photo_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    ensure_visible(&state, &current, id).await?;
    let file_name = state.db().delete_photo(id, photo_id).await?;
    if let Err(e) = utils::remove_file(state.config().uploads().join(&file_name)).await {
        warn!("Unable to remove photo file {file_name}: {e:#}");
    }
    Ok(Json(json!({ "success": true })))
}
