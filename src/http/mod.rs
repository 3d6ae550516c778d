//! The REST API served by `towbill serve`.
//!
//! JSON bodies use camelCase keys. Every route except login and the static uploads requires an
//! `Authorization: Bearer <token>` header obtained from `POST /api/login`.

mod admin;
mod company;
mod error;
mod extract;
mod invoices;
mod jobs;
mod photos;
mod services;
mod session;

use crate::db::Db;
use crate::error::IntoResult;
use crate::{Config, ErrorType, Result};
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Extra room in a request body for multipart framing and form fields.
const BODY_OVERHEAD: usize = 1024 * 1024;

/// State shared by all handlers.
#[derive(Debug)]
pub(crate) struct AppState {
    config: Config,
}

impl AppState {
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn db(&self) -> &Db {
        self.config.db()
    }
}

/// Builds the application router.
pub fn router(config: Config) -> Router {
    let body_limit = usize::try_from(config.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_mul(config.max_photos_per_job().max(1) as usize)
        .saturating_add(BODY_OVERHEAD);
    let uploads: PathBuf = config.uploads().to_path_buf();
    let state = Arc::new(AppState { config });

    let api = Router::new()
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/user", get(session::current_user))
        .route("/services", get(services::list))
        .route("/services/{id}", patch(services::update_rate))
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/recent", get(jobs::recent))
        .route("/jobs/{id}", get(jobs::get).delete(jobs::remove))
        .route("/jobs/{id}/services", post(jobs::add_services))
        .route("/jobs/{id}/invoice", get(invoices::for_job))
        .route("/jobs/{id}/invoice.html", get(invoices::html_for_job))
        .route("/jobs/{id}/invoice.txt", get(invoices::text_for_job))
        .route("/jobs/{id}/photos", get(photos::list).post(photos::upload))
        .route(
            "/jobs/{id}/photos/{photo_id}",
            get(photos::get).delete(photos::remove),
        )
        .route("/invoices/calculate", post(invoices::calculate))
        .route("/invoices", post(invoices::save))
        .route("/company", get(company::get).put(company::update))
        .route("/company/logo", post(company::upload_logo))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/users/{id}/company", patch(admin::set_company))
        .route("/admin/users/{id}/role", patch(admin::set_role))
        .route(
            "/admin/companies",
            get(admin::list_companies).post(admin::create_company),
        )
        .route("/admin/companies/{id}", delete(admin::delete_company));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(uploads))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Seeds the catalog and serves the API until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    config.db().seed_services().await?;
    let addr = config.bind_addr().to_string();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))
        .pub_result(ErrorType::Service)?;
    info!("Serving towbill API on http://{addr}");
    axum::serve(listener, router(config))
        .await
        .context("The HTTP server stopped unexpectedly")
        .pub_result(ErrorType::Service)
}
