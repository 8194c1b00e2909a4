//! Maps repository errors onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hq_core::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ApiError {
    fn code(&self) -> &'static str {
        match self.0 {
            AppError::NotFound(..) => "not-found",
            AppError::ValidationError(_) => "validation",
            AppError::PermissionDenied(_) => "permission",
            AppError::Transient(_) => "transient",
            AppError::Unauthorized(_) => "unauthorized",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) | AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Transient(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        HttpResponse::build(status).json(json!({
            "error": self.code(),
            "message": self.0.to_string(),
        }))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
