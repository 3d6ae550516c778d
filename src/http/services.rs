use super::error::ApiResult;
use super::extract::{ApiJson, ApiPath, CurrentUser};
use super::AppState;
use crate::model::{Rate, ServiceCatalogEntry};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<ServiceCatalogEntry>>> {
    Ok(Json(state.db().list_services().await?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateUpdate {
    rate: Rate,
}

pub(crate) async fn update_rate(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<RateUpdate>,
) -> ApiResult<Json<ServiceCatalogEntry>> {
    let text = match update.rate {
        Rate::Number(n) => n.to_string(),
        Rate::Text(s) => s,
    };
    Ok(Json(state.db().update_service_rate(id, &text).await?))
}

#[cfg(test)]
mod tests {
    use crate::http::testing::{app, login, send};
    use crate::test::TestEnv;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_update() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;

        let (status, body) = send(&app, "GET", "/api/services", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 19);
        assert_eq!(body[0]["rate"], "4.0");

        let (status, body) = send(
            &app,
            "PATCH",
            "/api/services/7",
            Some(&token),
            Some(json!({ "rate": 3.25 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rate"], "3.25");

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/services/7",
            Some(&token),
            Some(json!({ "rate": "lots" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/services/404",
            Some(&token),
            Some(json!({ "rate": "1.0" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/services/abc",
            Some(&token),
            Some(json!({ "rate": "1.0" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
