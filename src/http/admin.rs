//! User and company management. Every route requires the admin role.

use super::error::ApiResult;
use super::extract::{AdminUser, ApiJson, ApiPath};
use super::AppState;
use crate::error::validation;
use crate::model::{Company, NewUser, Role, User};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db().list_users().await?))
}

pub(crate) async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.db().create_user(&new_user).await?;
    info!("Admin '{}' created user '{}'", admin.username, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    if id == admin.id {
        return Err(validation("Cannot delete your own account").into());
    }
    state.db().delete_user(id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompanyAssignment {
    company_id: Option<i64>,
}

pub(crate) async fn set_company(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(assignment): ApiJson<CompanyAssignment>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state
            .db()
            .set_user_company(id, assignment.company_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleChange {
    role: Role,
}

pub(crate) async fn set_role(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<RoleChange>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.db().set_user_role(id, change.role).await?))
}

pub(crate) async fn list_companies(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.db().list_companies().await?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewCompany {
    name: String,
}

pub(crate) async fn create_company(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(new_company): ApiJson<NewCompany>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let company = state.db().create_company(&new_company.name).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub(crate) async fn delete_company(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.db().delete_company(id).await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::http::testing::{app, login, send};
    use crate::test::TestEnv;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_requires_admin() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;
        let (status, body) = send(&app, "GET", "/api/admin/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");
        let (status, _) = send(&app, "GET", "/api/admin/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_manage_users_and_companies() {
        let env = TestEnv::new().await;
        let admin = env.admin("boss").await;
        let app = app(&env);
        let token = login(&app, "boss").await;

        let (status, company) = send(
            &app,
            "POST",
            "/api/admin/companies",
            Some(&token),
            Some(json!({ "name": "Big Rig Recovery" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{company}");
        let company_id = company["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/companies",
            Some(&token),
            Some(json!({ "name": "Big Rig Recovery" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, user) = send(
            &app,
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({ "username": "driver", "password": "longenough", "companyId": company_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");
        assert_eq!(user["role"], "user");
        assert_eq!(user["companyId"], company_id);
        let user_id = user["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({ "username": "driver", "password": "longenough" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, user) = send(
            &app,
            "PATCH",
            &format!("/api/admin/users/{user_id}/role"),
            Some(&token),
            Some(json!({ "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["role"], "admin");

        let (status, user) = send(
            &app,
            "PATCH",
            &format!("/api/admin/users/{user_id}/company"),
            Some(&token),
            Some(json!({ "companyId": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(user["companyId"].is_null());

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/admin/users/{user_id}/company"),
            Some(&token),
            Some(json!({ "companyId": 999 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, users) = send(&app, "GET", "/api/admin/users", Some(&token), None).await;
        assert_eq!(users.as_array().unwrap().len(), 2);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/admin/users/{}", admin.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot delete your own account");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/admin/users/{user_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/admin/companies/{company_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, companies) = send(&app, "GET", "/api/admin/companies", Some(&token), None).await;
        assert!(companies.as_array().unwrap().is_empty());
    }
}
