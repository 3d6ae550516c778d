//! Request extractors: authentication and wrappers around axum's extractors whose rejections
//! become [`ApiError`]s.

use super::error::ApiError;
use super::AppState;
use crate::error::tagged;
use crate::model::{User, Viewer};
use crate::ErrorType;
use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use std::sync::Arc;

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub(crate) T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub(crate) struct ApiPath<T>(pub(crate) T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub(crate) struct ApiQuery<T>(pub(crate) T);

/// The logged in user, resolved from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser {
    pub(crate) user: User,
    pub(crate) token: String,
}

impl CurrentUser {
    pub(crate) fn viewer(&self) -> Viewer {
        Viewer::from(&self.user)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| tagged(ErrorType::Unauthorized, "Not authenticated"))?
            .to_string();
        let user = state
            .db()
            .user_for_session(&token)
            .await?
            .ok_or_else(|| tagged(ErrorType::Unauthorized, "Session expired or invalid"))?;
        Ok(CurrentUser { user, token })
    }
}

/// A logged in user with the admin role.
#[derive(Debug, Clone)]
pub(crate) struct AdminUser(pub(crate) User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_admin() {
            return Err(tagged(ErrorType::Forbidden, "Admin access required").into());
        }
        Ok(AdminUser(current.user))
    }
}
