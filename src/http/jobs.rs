use super::error::ApiResult;
use super::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use super::AppState;
use crate::error::{tagged, validation};
use crate::model::{
    CustomServiceItem, InvoiceServiceRecord, Job, JobDetail, JobInfo, NewInvoiceService,
    SubcontractorItem,
};
use crate::{utils, ErrorType, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Fails with `Forbidden` when the current user may not see the job and with `NotFound` when it
/// does not exist.
pub(super) async fn ensure_visible(state: &AppState, current: &CurrentUser, id: i64) -> Result<()> {
    if state.db().can_view_job(&current.viewer(), id).await? {
        Ok(())
    } else {
        Err(tagged(ErrorType::Forbidden, "Access denied"))
    }
}

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.db().list_jobs(&current.viewer()).await?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecentQuery {
    limit: Option<u32>,
}

pub(crate) async fn recent(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let limit = query
        .limit
        .unwrap_or_else(|| state.config().recent_jobs_limit());
    Ok(Json(
        state.db().recent_jobs(&current.viewer(), limit).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewJob {
    #[serde(flatten)]
    info: JobInfo,
    #[serde(default)]
    custom_services: Vec<CustomServiceItem>,
    #[serde(default)]
    subcontractors: Vec<SubcontractorItem>,
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(new_job): ApiJson<NewJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state
        .db()
        .create_job(
            Some(current.user.id),
            &new_job.info,
            &new_job.custom_services,
            &new_job.subcontractors,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<JobDetail>> {
    ensure_visible(&state, &current, id).await?;
    Ok(Json(state.db().get_job(id).await?))
}

pub(crate) async fn remove(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    ensure_visible(&state, &current, id).await?;
    let files = state.db().photo_files(id).await?;
    state.db().delete_job(id).await?;
    for file in files {
        if let Err(e) = utils::remove_file(state.config().uploads().join(&file)).await {
            warn!("Unable to remove photo {file} of deleted job {id}: {e:#}");
        }
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServiceCost {
    service_id: i64,
    cost: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddServices {
    services: Vec<ServiceCost>,
}

/// Stores the cost of selected services for a job. The name and rate are taken from the current
/// catalog.
pub(crate) async fn add_services(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<AddServices>,
) -> ApiResult<(StatusCode, Json<Vec<InvoiceServiceRecord>>)> {
    ensure_visible(&state, &current, id).await?;
    let catalog: HashMap<i64, _> = state
        .db()
        .list_services()
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let mut services = Vec::with_capacity(request.services.len());
    for item in request.services {
        let service = catalog
            .get(&item.service_id)
            .ok_or_else(|| validation(format!("Unknown service {}", item.service_id)))?;
        if !item.cost.is_finite() {
            return Err(validation(format!("Invalid cost for service {}", item.service_id)).into());
        }
        services.push(NewInvoiceService {
            service_id: service.id,
            service_name: service.name.clone(),
            rate: service.rate.cents_per_lb().to_string(),
            cost: item.cost,
        });
    }
    let records = state.db().create_invoice_services(id, &services).await?;
    Ok((StatusCode::CREATED, Json(records)))
}
