//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, models::envelope::Envelope, state::AppState};

/// Health check response.
///
/// Returns service status and database connectivity.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "code": 200,
///   "data": {
///     "status": "healthy",
///     "database": "connected",
///     "timestamp": "2025-12-21T19:00:00Z"
///   }
/// }
/// ```
///
/// If the database is unreachable, returns the standard error envelope.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Envelope<HealthResponse>>, AppError> {
    state.transactions.ping().await?;

    Ok(Envelope::ok(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        timestamp: Utc::now(),
    }))
}
