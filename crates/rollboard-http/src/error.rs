//! Mapping from domain errors to HTTP responses.
//!
//! Every failure is answered with a JSON body:
//!
//! ```json
//! { "error": "groups must be an array", "code": "validation_error" }
//! ```

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollboard_core::DashboardError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Error returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub DashboardError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Conflict(_) => StatusCode::CONFLICT,
            DashboardError::Forbidden(_) => StatusCode::FORBIDDEN,
            DashboardError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DashboardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(DashboardError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(DashboardError::Validation(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError(DashboardError::Validation(rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError(DashboardError::PayloadTooLarge(err.body_text()))
        } else {
            ApiError(DashboardError::Validation(err.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        } else {
            log::debug!("Request rejected ({}): {}", status, self.0);
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code(),
        });
        (status, body).into_response()
    }
}
