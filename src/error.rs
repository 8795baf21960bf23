use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::extraction::ExtractError;
use crate::utils::validation::ValidationError;

/// HTTP-facing errors. Internal faults are logged and surfaced with a
/// generic message so no internals leak into response bodies.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            ValidationError::UnsupportedFormat { .. } | ValidationError::CorruptImage { .. } => {
                AppError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Validation(v) => v.into(),
            ExtractError::Worker(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_status_codes() {
        let too_large: AppError = ValidationError::TooLarge {
            size: 11,
            max: 10,
        }
        .into();
        assert!(matches!(too_large, AppError::PayloadTooLarge(_)));

        let unsupported: AppError = ValidationError::UnsupportedFormat {
            allowed: "jpg".to_string(),
        }
        .into();
        assert!(matches!(unsupported, AppError::BadRequest(_)));

        let corrupt: AppError = ValidationError::CorruptImage {
            reason: "file is empty".to_string(),
        }
        .into();
        assert!(matches!(corrupt, AppError::BadRequest(_)));
    }

    #[test]
    fn test_internal_fault_hides_details() {
        let response = AppError::Internal("db password is hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
