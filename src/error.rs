//! Error types for BucketGate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse`. Failures a browser can hit map to
//! the fixed HTML pages the gateway serves; internal failures map to
//! plain-text gateway errors.

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::api::pages;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// A required path or query parameter was absent (400, not-found page)
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Object absent, or the store failed while fetching it (400, not-found page)
    #[error("Object not found")]
    ObjectUnavailable,

    /// Upload form submitted without a valid password or file (400, form page)
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// Store write failed during an upload (400, plain message)
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Object store error (502)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Fetching a remote source failed (502)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A store call exceeded the configured bound (504)
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// Transport failure talking to a remote source (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Object name rejected before reaching the store (400)
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::MissingParameter(_) => "missing_parameter",
            AppError::ObjectUnavailable => "object_unavailable",
            AppError::UploadRejected(_) => "upload_rejected",
            AppError::UploadFailed(_) => "upload_failed",
            AppError::Storage(_) => "storage",
            AppError::Fetch(_) => "fetch",
            AppError::Timeout(_) => "timeout",
            AppError::HttpClient(_) => "http_client",
            AppError::InvalidName(_) => "invalid_name",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL
            .with_label_values(&[self.error_type()])
            .inc();

        match self {
            AppError::MissingParameter(_) | AppError::ObjectUnavailable => {
                (StatusCode::BAD_REQUEST, Html(pages::NOT_FOUND_HTML)).into_response()
            }
            AppError::UploadRejected(_) => {
                (StatusCode::BAD_REQUEST, Html(pages::UPLOAD_HTML)).into_response()
            }
            AppError::UploadFailed(_) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "Failed to upload file.",
            )
                .into_response(),
            AppError::InvalidName(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Timeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string()).into_response()
            }
            AppError::Storage(_) | AppError::Fetch(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
            }
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
                .into_response(),
        }
    }
}
