use super::error::ApiResult;
use super::extract::{ApiJson, ApiPath, CurrentUser};
use super::jobs::ensure_visible;
use super::AppState;
use crate::model::{stored_percent, validate, Invoice, InvoiceRequest, JobDetail};
use crate::render;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Computes an invoice against the stored catalog without saving anything.
pub(crate) async fn calculate(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ApiJson(request): ApiJson<InvoiceRequest>,
) -> ApiResult<Json<Invoice>> {
    let catalog = state.db().list_services().await?;
    Ok(Json(request.calculate(&catalog)))
}

#[derive(Debug, Serialize)]
pub(crate) struct SavedInvoice {
    job: JobDetail,
    invoice: Invoice,
}

/// Computes an invoice and saves the job, its line items and the selected service costs. The
/// surcharge is rounded to its stored form first so the saved job rebuilds the same invoice.
pub(crate) async fn save(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(mut request): ApiJson<InvoiceRequest>,
) -> ApiResult<(StatusCode, Json<SavedInvoice>)> {
    request.job.fuel_surcharge = stored_percent(request.job.fuel_surcharge);
    let catalog = state.db().list_services().await?;
    validate::ready_for_invoice(&request.job, &request.selected_services, &catalog)?;
    let invoice = request.calculate(&catalog);
    let job = state
        .db()
        .save_invoice(Some(current.user.id), &invoice)
        .await?;
    Ok((StatusCode::CREATED, Json(SavedInvoice { job, invoice })))
}

async fn load_job(state: &AppState, current: &CurrentUser, id: i64) -> ApiResult<JobDetail> {
    ensure_visible(state, current, id).await?;
    Ok(state.db().get_job(id).await?)
}

/// The invoice of a saved job, rebuilt from its stored records.
pub(crate) async fn for_job(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Invoice>> {
    let detail = load_job(&state, &current, id).await?;
    Ok(Json(detail.invoice()))
}

/// The printable invoice of a saved job, branded with the settings of the user that created it.
pub(crate) async fn html_for_job(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Html<String>> {
    let detail = load_job(&state, &current, id).await?;
    let owner = detail.job.user_id.unwrap_or(current.user.id);
    let settings = state.db().get_company_settings(owner).await?;
    let html = render::html_document(
        &detail.invoice(),
        &settings,
        &detail.photos,
        state.config().date_format(),
    )?;
    Ok(Html(html))
}

/// The short share summary of a saved job.
pub(crate) async fn text_for_job(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<String> {
    let detail = load_job(&state, &current, id).await?;
    Ok(render::share_text(&detail.invoice()))
}

#[cfg(test)]
mod tests {
    use crate::http::testing::{app, login, send};
    use crate::model::validate::NOT_READY_MESSAGE;
    use crate::test::TestEnv;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn request(selected: Value, weight: i64) -> Value {
        json!({
            "job": {
                "customerName": "Acme Freight",
                "invoiceNumber": "1001",
                "vehicleType": "Tractor trailer",
                "vehicleWeight": weight,
                "problemDescription": "Jackknifed",
                "fuelSurcharge": 10
            },
            "selectedServices": selected,
            "customServices": [{ "name": "Road cleanup", "price": 50 }],
            "subcontractors": [{ "name": "Crane Co", "workPerformed": "Lift", "price": "100.00" }]
        })
    }

    fn close(value: &Value, expected: f64) -> bool {
        (value.as_f64().unwrap() - expected).abs() < 0.005
    }

    #[tokio::test]
    async fn test_calculate() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;

        let (status, invoice) = send(
            &app,
            "POST",
            "/api/invoices/calculate",
            Some(&token),
            Some(request(json!({ "1": true, "3": true }), 5000)),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{invoice}");
        assert!(close(&invoice["subtotal"], 475.0));
        assert!(close(&invoice["fuelSurchargeAmount"], 52.5));
        assert!(close(&invoice["total"], 677.5));

        // No readiness check when only calculating
        let (status, invoice) = send(
            &app,
            "POST",
            "/api/invoices/calculate",
            Some(&token),
            Some(request(json!([]), 0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(close(&invoice["subtotal"], 0.0));
    }

    #[tokio::test]
    async fn test_save_and_render() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;

        let (status, saved) = send(
            &app,
            "POST",
            "/api/invoices",
            Some(&token),
            Some(request(json!([1, 3]), 5000)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{saved}");
        assert_eq!(saved["job"]["invoiceServices"].as_array().unwrap().len(), 2);
        assert!(close(&saved["invoice"]["total"], 677.5));
        let id = saved["job"]["id"].as_i64().unwrap();

        let (status, invoice) = send(
            &app,
            "GET",
            &format!("/api/jobs/{id}/invoice"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(close(&invoice["total"], 677.5));

        let (status, text) = send(
            &app,
            "GET",
            &format!("/api/jobs/{id}/invoice.txt"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Invoice #1001\nCustomer: Acme Freight\nTotal: $677.50");

        let (status, html) = send(
            &app,
            "GET",
            &format!("/api/jobs/{id}/invoice.html"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let html = html.as_str().unwrap();
        assert!(html.contains("<h1>Professional Towing</h1>"));
        assert!(html.contains("$677.50"));
    }

    #[tokio::test]
    async fn test_saved_invoice_matches_rebuilt() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;

        let mut body = request(json!([1]), 100000);
        body["job"]["fuelSurcharge"] = json!(12.345);
        let (status, saved) = send(&app, "POST", "/api/invoices", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{saved}");
        assert_eq!(saved["job"]["fuelSurcharge"], 12.35);
        assert_eq!(saved["invoice"]["fuelSurcharge"], 12.35);
        let id = saved["job"]["id"].as_i64().unwrap();

        let (status, rebuilt) = send(
            &app,
            "GET",
            &format!("/api/jobs/{id}/invoice"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rebuilt["fuelSurcharge"], saved["invoice"]["fuelSurcharge"]);
        assert_eq!(rebuilt["total"], saved["invoice"]["total"]);
    }

    #[tokio::test]
    async fn test_save_requires_services_and_weight() {
        let env = TestEnv::new().await;
        env.user("dispatch").await;
        let app = app(&env);
        let token = login(&app, "dispatch").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/invoices",
            Some(&token),
            Some(request(json!({ "1": false }), 5000)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NOT_READY_MESSAGE);

        let (status, _) = send(
            &app,
            "POST",
            "/api/invoices",
            Some(&token),
            Some(request(json!([1]), 0)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
