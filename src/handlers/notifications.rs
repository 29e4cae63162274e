//! Payment gateway webhook handler.

use axum::{Json, body::Bytes, extract::State};

use crate::{
    error::AppError,
    models::{envelope::Envelope, notification::NotificationAck},
    state::AppState,
};

/// Receive a payment status notification.
///
/// # Endpoint
///
/// `POST /notification`
///
/// The body is read raw and decoded against the typed payload schema, so a
/// missing or mistyped field produces a `400` envelope instead of axum's
/// default rejection.
///
/// # Response (200)
///
/// ```json
/// { "code": 200, "data": { "order_id": "1735689600", "status": "success" } }
/// ```
pub async fn payment_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Envelope<NotificationAck>>, AppError> {
    let ack = state.notifications.handle(&body).await?;
    Ok(Envelope::ok(ack))
}
