use super::error::ApiResult;
use super::extract::{ApiJson, CurrentUser};
use super::photos::{next_image, store_upload};
use super::AppState;
use crate::error::validation;
use crate::model::{CompanySettings, CompanySettingsPatch};
use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;

const LOGO_FIELD: &str = "logo";
const LOGO_DIR: &str = "logos";

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<CompanySettings>> {
    Ok(Json(
        state.db().get_company_settings(current.user.id).await?,
    ))
}

pub(crate) async fn update(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(patch): ApiJson<CompanySettingsPatch>,
) -> ApiResult<Json<CompanySettings>> {
    Ok(Json(
        state
            .db()
            .update_company_settings(current.user.id, &patch)
            .await?,
    ))
}

/// Stores an uploaded logo image and makes it the user's company logo.
pub(crate) async fn upload_logo(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<CompanySettings>> {
    let image = next_image(&mut multipart, LOGO_FIELD, state.config().max_upload_bytes())
        .await?
        .ok_or_else(|| validation("No logo uploaded"))?;
    let stored = store_upload(state.config().uploads(), LOGO_DIR, &image).await?;
    let patch = CompanySettingsPatch {
        company_logo: Some(stored.public_path),
        ..CompanySettingsPatch::default()
    };
    Ok(Json(
        state
            .db()
            .update_company_settings(current.user.id, &patch)
            .await?,
    ))
}
