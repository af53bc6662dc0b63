//! API error taxonomy and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pulseboard_store::StoreError;
use tracing::{debug, error};

/// Errors surfaced to API callers as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed `type`, `value`, `data` or body.
    Validation(String),
    /// No metric with the requested id.
    NotFound,
    /// Any underlying persistence failure.
    Store(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::NotFound => "Metric not found".to_string(),
            ApiError::Store(e) => e.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Store(other),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Store(e) => error!(error = %e, "metric store fault"),
            other => debug!(%status, message = %other.message(), "request rejected"),
        }
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}
