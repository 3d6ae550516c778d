use super::error::ApiResult;
use super::extract::{ApiJson, CurrentUser};
use super::AppState;
use crate::model::User;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    token: String,
    user: User,
}

pub(crate) async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db()
        .authenticate(request.username.trim(), &request.password)
        .await?;
    let session = state
        .db()
        .create_session(user.id, state.config().session_ttl_hours())
        .await?;
    info!("User '{}' logged in", user.username);
    Ok(Json(LoginResponse {
        token: session.token,
        user,
    }))
}

pub(crate) async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    state.db().delete_session(&current.token).await?;
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn current_user(current: CurrentUser) -> Json<User> {
    Json(current.user)
}
