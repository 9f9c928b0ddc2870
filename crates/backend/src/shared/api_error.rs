use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use contracts::shared::api::ApiResponse;

use crate::domain::a001_pass::error::PassError;

/// Ошибка HTTP-обработчика в конверте `{success: false, message, scanTime?}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    scan_time: Option<DateTime<Utc>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            scan_time: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PassError> for ApiError {
    fn from(err: PassError) -> Self {
        match err {
            PassError::Validation(message) | PassError::Conflict(message) => {
                Self::bad_request(message)
            }
            PassError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            PassError::AlreadyScanned { scan_time } => Self {
                scan_time,
                ..Self::bad_request(PassError::AlreadyScanned { scan_time }.to_string())
            },
            PassError::Storage(source) => {
                tracing::error!("Storage failure: {:#}", source);
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            scan_time: self.scan_time,
            ..ApiResponse::error(self.message)
        };
        (self.status, Json(body)).into_response()
    }
}
