use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Template store error: {0}")]
    Template(#[from] TemplateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Render error: {0}")]
    Render(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

/// Hide internal detail from clients in production, keep it for the log
fn masked(log_msg: String, generic: &str) -> (String, String) {
    let client_msg = if is_production() {
        generic.to_string()
    } else {
        log_msg.clone()
    };
    (client_msg, log_msg)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, (client_message, log_message)) = match &self {
            AppError::Template(TemplateError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "TEMPLATE_NOT_FOUND",
                (format!("Template not found: {}", id), id.clone()),
            ),
            AppError::Template(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "TEMPLATE_STORE_ERROR",
                masked(e.to_string(), "Template store unavailable"),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                (msg.clone(), msg.clone()),
            ),
            AppError::Render(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RENDER_ERROR",
                (msg.clone(), msg.clone()),
            ),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::TemplateNotFound(id) => AppError::Template(TemplateError::NotFound(id)),
            DispatchError::Render(msg) => AppError::Render(msg),
            DispatchError::Storage(msg) => AppError::Template(TemplateError::Storage(msg)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("recipient is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_template_not_found_maps_to_404() {
        let response =
            AppError::Template(TemplateError::NotFound("welcome".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_dispatch_errors_map_to_status() {
        let response =
            AppError::from(DispatchError::TemplateNotFound("welcome".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            AppError::from(DispatchError::Render("unexpected end".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response =
            AppError::from(DispatchError::Storage("pool closed".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
