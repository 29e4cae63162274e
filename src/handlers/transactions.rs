//! Transaction HTTP handlers.
//!
//! This module implements booking-related API endpoints:
//! - GET /transactions - List all bookings
//! - GET /transaction/{id} - Get booking details
//! - POST /transaction - Create a booking and open a payment session
//! - DELETE /transaction/{id} - Delete a booking

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    error::AppError,
    models::{
        envelope::Envelope,
        transaction::{CreateTransactionRequest, TransactionResponse},
    },
    state::AppState,
};

/// List all bookings with their house and user.
pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<TransactionResponse>>>, AppError> {
    let base_url = state.uploads.base_url();
    let transactions = state
        .transactions
        .list()
        .await?
        .into_iter()
        .map(|details| TransactionResponse::with_base_url(details, base_url))
        .collect();

    Ok(Envelope::ok(transactions))
}

/// Get a booking by ID.
///
/// # Response
///
/// - **Success (200 OK)**: booking with house and user
/// - **Error (404)**: no such booking
pub async fn get_transaction(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Envelope<TransactionResponse>>, AppError> {
    let Path(id) = path?;

    let details = state
        .transactions
        .get(id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    Ok(Envelope::ok(TransactionResponse::with_base_url(
        details,
        state.uploads.base_url(),
    )))
}

/// Create a booking.
///
/// # Request Body
///
/// ```json
/// {
///   "check_in": "2025-03-01",
///   "check_out": "2025-03-04",
///   "house_id": 3,
///   "user_id": 12,
///   "total": 2700000
/// }
/// ```
///
/// # Response (200)
///
/// The payment gateway's checkout session, unmodified:
///
/// ```json
/// { "code": 200, "data": { "token": "...", "redirect_url": "https://..." } }
/// ```
///
/// # Errors
///
/// - **400**: body is not valid JSON for this schema
/// - **404**: house does not exist
/// - **409**: id collision with a concurrent request
/// - **422**: validation failed
/// - **502**: payment gateway failed; the booking exists and stays pending,
///   and sending the same request again retries payment for it
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    let Json(request) = payload?;

    let session = state.bookings.create(request).await?;

    Ok(Envelope::ok(session))
}

/// Delete a booking.
///
/// # Response
///
/// - **Success (200 OK)**: the deleted booking
/// - **Error (404)**: no such booking
pub async fn delete_transaction(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Envelope<TransactionResponse>>, AppError> {
    let Path(id) = path?;

    let details = state
        .transactions
        .get(id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    state
        .transactions
        .delete(id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;
    tracing::info!(transaction_id = id, "transaction deleted");

    Ok(Envelope::ok(TransactionResponse::with_base_url(
        details,
        state.uploads.base_url(),
    )))
}
