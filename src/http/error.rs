//! Maps errors to JSON responses of the form `{"error": "..."}`.

use crate::error::{error_type, user_message};
use crate::{Error, ErrorType};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

pub(crate) type ApiResult<T> = std::result::Result<T, ApiError>;

/// An error returned by a handler.
#[derive(Debug)]
pub(crate) struct ApiError(Error);

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

fn status_for(error_type: ErrorType) -> StatusCode {
    match error_type {
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorType::Forbidden => StatusCode::FORBIDDEN,
        ErrorType::Conflict => StatusCode::CONFLICT,
        ErrorType::Config
        | ErrorType::Database
        | ErrorType::Io
        | ErrorType::Service => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extractor rejections carry their own messages and are the client's fault.
fn rejection_message(e: &Error) -> Option<String> {
    if let Some(r) = e.downcast_ref::<JsonRejection>() {
        return Some(r.body_text());
    }
    if let Some(r) = e.downcast_ref::<PathRejection>() {
        return Some(r.body_text());
    }
    if let Some(r) = e.downcast_ref::<QueryRejection>() {
        return Some(r.body_text());
    }
    if let Some(r) = e.downcast_ref::<MultipartRejection>() {
        return Some(r.body_text());
    }
    None
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match (error_type(&self.0), rejection_message(&self.0)) {
            (Some(t), _) => {
                let status = status_for(t);
                if status.is_server_error() {
                    error!("{}: {:#}", t, self.0);
                    // Only the outermost context is shown to clients for internal failures.
                    (status, self.0.to_string())
                } else {
                    warn!("{}: {:#}", t, self.0);
                    (status, user_message(&self.0))
                }
            }
            (None, Some(message)) => {
                warn!("Rejected request: {message}");
                (StatusCode::BAD_REQUEST, message)
            }
            (None, None) => {
                error!("Unhandled error: {:#}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
