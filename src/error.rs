/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status + JSON error body)
 * - Map LarkError / ConfigError into a single client-facing shape
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::lark::LarkError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{0}")]
    Misconfigured(String),
    #[error("{code}: {message}")]
    BadGateway { code: &'static str, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadGateway {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Misconfigured(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                message,
            ),
            AppError::BadGateway { code, message } => (StatusCode::BAD_GATEWAY, code, message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LarkError> for AppError {
    fn from(e: LarkError) -> Self {
        match e {
            LarkError::Validation(message) => AppError::bad_request("BAD_REQUEST", message),
            LarkError::Configuration(key) => AppError::Misconfigured(format!(
                "{key} is not configured (LARK_APP_ID and LARK_APP_SECRET must be set)"
            )),
            // Upstream payloads are forwarded for diagnostics, as the proxy always has.
            e @ LarkError::UpstreamAuth { .. } => {
                AppError::bad_gateway("UPSTREAM_AUTH_ERROR", e.to_string())
            }
            e @ LarkError::UpstreamTicket { .. } => {
                AppError::bad_gateway("UPSTREAM_TICKET_ERROR", e.to_string())
            }
            e @ LarkError::Upstream { .. } => AppError::bad_gateway("UPSTREAM_ERROR", e.to_string()),
            LarkError::Internal(_) => AppError::Internal,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Misconfigured(e.to_string())
    }
}
