use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::layout::{FitFailurePayload, ShrinkExhausted};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The fit loop gave up; `details` tells the caller what to cut.
    #[error("{message}")]
    ContentTooLarge {
        message: String,
        details: Box<FitFailurePayload>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ShrinkExhausted> for AppError {
    fn from(err: ShrinkExhausted) -> Self {
        AppError::ContentTooLarge {
            message: err.to_string(),
            details: Box::new(err.to_payload()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::ContentTooLarge { message, details } => {
                tracing::warn!(
                    reason = %details.reason,
                    errors = details.validation_errors.len(),
                    changes = details.shrink_changes.len(),
                    "Content too large: {message}"
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "CONTENT_TOO_LARGE",
                    message,
                    Some(details),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}
