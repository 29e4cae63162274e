//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and the JSON error
//! envelope.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::envelope::ErrorEnvelope;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Validation Errors**: malformed bodies, missing or invalid fields
/// - **Resource Errors**: requested house or transaction not found
/// - **Persistence Errors**: any sqlx::Error, plus uniqueness conflicts
/// - **Integration Errors**: payment gateway failures, bad webhook payloads
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// Returns HTTP 500 without leaking the underlying message.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body or parameters could not be decoded.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Request decoded but failed field validation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("{0}")]
    Validation(String),

    /// Returns HTTP 404 Not Found.
    #[error("House not found")]
    HouseNotFound,

    /// Returns HTTP 404 Not Found.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// Insert hit the primary-key constraint; another request claimed the id
    /// between the availability check and the insert.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Transaction id {0} is already in use")]
    DuplicateTransaction(i64),

    /// Webhook payload does not match the expected schema.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Malformed notification: {0}")]
    MalformedWebhook(String),

    /// Webhook signature does not match the configured server key.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid notification signature")]
    InvalidSignature,

    /// Payment gateway could not create a checkout session. The caller may
    /// retry.
    ///
    /// Returns HTTP 502 Bad Gateway.
    #[error("{0}")]
    PaymentGateway(String),

    /// Uploaded file could not be stored.
    ///
    /// Returns HTTP 500.
    #[error("Upload failed: {0}")]
    Upload(#[from] std::io::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        AppError::InvalidRequest(error.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::MalformedWebhook(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::HouseNotFound | AppError::TransactionNotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            AppError::InvalidSignature => StatusCode::FORBIDDEN,
            AppError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "code": 404,
///   "message": "House not found"
/// }
/// ```
///
/// Database and upload failures are logged and replaced by a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::Database(ref e) => {
                tracing::error!("database error: {e}");
                "An internal error occurred".to_string()
            }
            AppError::Upload(ref e) => {
                tracing::error!("upload error: {e}");
                "An internal error occurred".to_string()
            }
            ref other => other.to_string(),
        };

        let body = Json(ErrorEnvelope {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}
