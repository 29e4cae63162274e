//! Payment notification models.
//!
//! This module defines:
//! - `NotificationPayload`: the typed webhook body sent by the payment gateway
//! - `NotificationEvent`: a recorded email delivery attempt
//! - `NotificationAck`: the webhook response body

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::transaction::PaymentStatus};

/// Webhook body posted by the payment gateway.
///
/// Only the fields used here are declared; anything else the gateway sends
/// is ignored.
///
/// # Example
///
/// ```json
/// {
///   "transaction_status": "capture",
///   "fraud_status": "accept",
///   "order_id": "1735689600",
///   "status_code": "200",
///   "gross_amount": "2700000.00",
///   "signature_key": "9f1c..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPayload {
    pub transaction_status: String,

    /// Present for card payments; required when the status is `capture`
    #[serde(default)]
    pub fraud_status: Option<String>,

    pub order_id: String,

    #[serde(default)]
    pub status_code: Option<String>,

    #[serde(default)]
    pub gross_amount: Option<String>,

    #[serde(default)]
    pub signature_key: Option<String>,
}

impl NotificationPayload {
    /// Decode a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| AppError::MalformedWebhook(e.to_string()))
    }

    /// The transaction id this notification refers to.
    pub fn transaction_id(&self) -> Result<i64, AppError> {
        self.order_id.trim().parse().map_err(|_| {
            AppError::MalformedWebhook(format!("order_id {:?} is not a transaction id", self.order_id))
        })
    }

    /// Map the gateway status onto a payment status.
    ///
    /// | transaction_status | fraud_status | result  |
    /// |--------------------|--------------|---------|
    /// | capture            | challenge    | pending |
    /// | capture            | accept       | success |
    /// | settlement         |              | success |
    /// | deny               |              | failed  |
    /// | cancel / expire    |              | failed  |
    /// | pending            |              | pending |
    ///
    /// Anything else yields `None` and leaves the transaction untouched.
    pub fn target_status(&self) -> Result<Option<PaymentStatus>, AppError> {
        let status = match self.transaction_status.as_str() {
            "capture" => match self.fraud_status.as_deref() {
                Some("challenge") => Some(PaymentStatus::Pending),
                Some("accept") => Some(PaymentStatus::Success),
                Some(_) => None,
                None => {
                    return Err(AppError::MalformedWebhook(
                        "fraud_status is required for capture".to_string(),
                    ));
                }
            },
            "settlement" => Some(PaymentStatus::Success),
            "deny" | "cancel" | "expire" => Some(PaymentStatus::Failed),
            "pending" => Some(PaymentStatus::Pending),
            _ => None,
        };
        Ok(status)
    }
}

/// One email delivery attempt, stored in `notification_events`.
///
/// Rows with `delivered = false` are the dead letters left after retries ran
/// out.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub transaction_id: i64,
    pub recipient: String,
    pub status: PaymentStatus,
    pub attempts: i32,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Webhook response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAck {
    pub order_id: String,

    /// Status written to the transaction, `null` if the notification was ignored
    pub status: Option<PaymentStatus>,
}
