//! Payment notification handling.
//!
//! This module handles:
//! - Verifying and decoding payment gateway webhooks
//! - Mapping gateway statuses onto stored payment statuses
//! - Emailing the guest when a booking becomes paid
//!
//! # Delivery Guarantees
//!
//! A failed email never fails the webhook and never stops the status update.
//! Delivery is retried with backoff; the final outcome of every send is
//! recorded in `notification_events`, where undelivered rows act as a
//! dead-letter queue.

use std::sync::Arc;

use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        notification::{NotificationAck, NotificationEvent, NotificationPayload},
        transaction::{PaymentStatus, TransactionDetails},
    },
    repositories::{StatusUpdate, TransactionRepository},
    services::{
        mailer::{MailError, Mailer, OutgoingMail, render_status_email},
        retry::RetryPolicy,
    },
};

const SUBJECT: &str = "Transaction Status";

/// Sends the "transaction status" email.
#[derive(Clone)]
pub struct NotificationSender {
    mailer: Arc<dyn Mailer>,
    transactions: Arc<dyn TransactionRepository>,
    retry: RetryPolicy,
}

impl NotificationSender {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        transactions: Arc<dyn TransactionRepository>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            mailer,
            transactions,
            retry,
        }
    }

    /// Email the guest if `target` is `success`. Otherwise does nothing.
    ///
    /// Call this only after [`TransactionRepository::update_status`] reported
    /// [`StatusUpdate::Changed`]; that write is what keeps repeated or
    /// concurrent `success` notifications down to one email.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if an email was delivered, `Ok(false)` if none was due.
    ///
    /// # Errors
    ///
    /// The last `MailError` once all attempts failed.
    pub async fn notify(
        &self,
        target: PaymentStatus,
        details: &TransactionDetails,
    ) -> Result<bool, MailError> {
        if target != PaymentStatus::Success {
            return Ok(false);
        }

        let mail = OutgoingMail {
            to: details.user_email.clone(),
            subject: SUBJECT.to_string(),
            html_body: render_status_email(&details.house_name, details.house_price, target.as_str()),
        };

        let mut attempts = 0;
        let mut outcome = Ok(());
        for attempt in 0..self.retry.attempts {
            attempts = attempt + 1;
            outcome = self.mailer.send(&mail).await;

            if let Err(e) = &outcome {
                tracing::warn!(
                    transaction_id = details.transaction.id,
                    attempt = attempts,
                    "mail delivery failed: {e}"
                );
            } else {
                break;
            }

            if attempts < self.retry.attempts {
                self.retry.wait_after(attempt).await;
            }
        }

        let event = NotificationEvent {
            id: Uuid::new_v4(),
            transaction_id: details.transaction.id,
            recipient: mail.to.clone(),
            status: target,
            attempts: attempts as i32,
            delivered: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
        };
        if let Err(e) = self.transactions.record_notification(event).await {
            tracing::error!(
                transaction_id = details.transaction.id,
                "failed to record notification event: {e}"
            );
        }

        outcome?;
        tracing::info!("Mail sent! to {}", mail.to);
        Ok(true)
    }
}

/// Applies payment gateway notifications to stored transactions.
#[derive(Clone)]
pub struct NotificationService {
    transactions: Arc<dyn TransactionRepository>,
    sender: NotificationSender,

    /// Server key used to check `signature_key`; `None` disables the check
    signature_key: Option<String>,
}

impl NotificationService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        sender: NotificationSender,
        signature_key: Option<String>,
    ) -> Self {
        Self {
            transactions,
            sender,
            signature_key,
        }
    }

    /// Process one webhook body.
    ///
    /// # Process
    ///
    /// 1. Decode the typed payload
    /// 2. Verify the signature (when enabled)
    /// 3. Load the transaction with its house and user
    /// 4. Map the gateway status; unknown statuses are acknowledged unchanged
    /// 5. Persist the new status if it differs from the stored one
    /// 6. If it did, send the status email (see [`NotificationSender::notify`])
    ///
    /// # Errors
    ///
    /// - `MalformedWebhook`: body does not match the payload schema
    /// - `InvalidSignature`: signature missing or wrong
    /// - `TransactionNotFound`: unknown order id
    /// - `Database`: lookup or update failed
    pub async fn handle(&self, body: &[u8]) -> Result<NotificationAck, AppError> {
        let payload = NotificationPayload::from_slice(body)?;

        if let Some(server_key) = &self.signature_key {
            verify_signature(&payload, server_key)?;
        }

        let id = payload.transaction_id()?;
        let details = self
            .transactions
            .get(id)
            .await?
            .ok_or(AppError::TransactionNotFound)?;

        let Some(target) = payload.target_status()? else {
            tracing::info!(
                order_id = %payload.order_id,
                transaction_status = %payload.transaction_status,
                "ignoring notification with unmapped status"
            );
            return Ok(NotificationAck {
                order_id: payload.order_id,
                status: None,
            });
        };

        match self.transactions.update_status(id, target).await? {
            StatusUpdate::Missing => return Err(AppError::TransactionNotFound),
            StatusUpdate::Unchanged => {
                tracing::info!(transaction_id = id, status = %target, "payment status already applied");
            }
            StatusUpdate::Changed => {
                tracing::info!(transaction_id = id, status = %target, "payment status updated");

                if let Err(e) = self.sender.notify(target, &details).await {
                    tracing::error!(
                        transaction_id = id,
                        "giving up on status email, recorded as undelivered: {e}"
                    );
                }
            }
        }

        Ok(NotificationAck {
            order_id: payload.order_id,
            status: Some(target),
        })
    }
}

/// Check `signature_key = hex(sha512(order_id + status_code + gross_amount + server_key))`.
fn verify_signature(payload: &NotificationPayload, server_key: &str) -> Result<(), AppError> {
    let (Some(status_code), Some(gross_amount), Some(signature)) = (
        payload.status_code.as_deref(),
        payload.gross_amount.as_deref(),
        payload.signature_key.as_deref(),
    ) else {
        return Err(AppError::InvalidSignature);
    };

    let expected = signature_for(&payload.order_id, status_code, gross_amount, server_key);

    if constant_time_eq(expected.as_bytes(), signature.to_ascii_lowercase().as_bytes()) {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}

pub fn signature_for(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryStore, RecordingMailer};
    use serde_json::json;

    const ORDER: i64 = 1_735_689_600;

    struct Fixture {
        store: Arc<InMemoryStore>,
        mailer: Arc<RecordingMailer>,
        service: NotificationService,
    }

    fn fixture(mailer: RecordingMailer, signature_key: Option<&str>) -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        store.seed_transaction(ORDER);
        let mailer = Arc::new(mailer);
        let sender = NotificationSender::new(mailer.clone(), store.clone(), RetryPolicy::immediate(3));
        let service =
            NotificationService::new(store.clone(), sender, signature_key.map(str::to_string));

        Fixture {
            store,
            mailer,
            service,
        }
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    fn settlement() -> Vec<u8> {
        body(json!({ "transaction_status": "settlement", "order_id": ORDER.to_string() }))
    }

    #[tokio::test]
    async fn settlement_marks_success_and_sends_one_email() {
        let f = fixture(RecordingMailer::default(), None);

        let ack = f.service.handle(&settlement()).await.unwrap();

        assert_eq!(ack.status, Some(PaymentStatus::Success));
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Success));
        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ayu@example.com");
        assert_eq!(sent[0].subject, "Transaction Status");
    }

    #[tokio::test]
    async fn repeated_settlement_sends_no_second_email() {
        let f = fixture(RecordingMailer::default(), None);

        f.service.handle(&settlement()).await.unwrap();
        f.service.handle(&settlement()).await.unwrap();

        assert_eq!(f.mailer.sent().len(), 1);
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Success));
    }

    #[tokio::test]
    async fn overlapping_redeliveries_send_one_email() {
        let f = fixture(RecordingMailer::default(), None);
        let notification = settlement();

        let (first, second) = tokio::join!(
            f.service.handle(&notification),
            f.service.handle(&notification)
        );

        assert_eq!(first.unwrap().status, Some(PaymentStatus::Success));
        assert_eq!(second.unwrap().status, Some(PaymentStatus::Success));
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Success));
        assert_eq!(f.mailer.sent().len(), 1);
        assert_eq!(f.store.notification_events().len(), 1);
    }

    #[tokio::test]
    async fn failure_statuses_update_without_email() {
        let f = fixture(RecordingMailer::default(), None);

        let ack = f
            .service
            .handle(&body(json!({ "transaction_status": "expire", "order_id": ORDER.to_string() })))
            .await
            .unwrap();

        assert_eq!(ack.status, Some(PaymentStatus::Failed));
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Failed));
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn unmapped_status_is_acknowledged_without_changes() {
        let f = fixture(RecordingMailer::default(), None);

        let ack = f
            .service
            .handle(&body(json!({ "transaction_status": "refund", "order_id": ORDER.to_string() })))
            .await
            .unwrap();

        assert_eq!(ack.status, None);
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Pending));
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_is_retried_and_status_still_updates() {
        let f = fixture(RecordingMailer::failing(2), None);

        let ack = f.service.handle(&settlement()).await.unwrap();

        assert_eq!(ack.status, Some(PaymentStatus::Success));
        assert_eq!(f.mailer.attempts(), 3);
        assert_eq!(f.mailer.sent().len(), 1);

        let events = f.store.notification_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].delivered);
        assert_eq!(events[0].attempts, 3);
    }

    #[tokio::test]
    async fn exhausted_retries_are_dead_lettered() {
        let f = fixture(RecordingMailer::failing(u32::MAX), None);

        let ack = f.service.handle(&settlement()).await.unwrap();

        assert_eq!(ack.status, Some(PaymentStatus::Success));
        assert_eq!(f.store.status_of(ORDER), Some(PaymentStatus::Success));

        let events = f.store.notification_events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].delivered);
        assert!(events[0].error.is_some());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let f = fixture(RecordingMailer::default(), None);

        let result = f
            .service
            .handle(&body(json!({ "transaction_status": "settlement", "order_id": "42" })))
            .await;

        assert!(matches!(result, Err(AppError::TransactionNotFound)));
    }

    #[tokio::test]
    async fn signature_is_checked_when_enabled() {
        let f = fixture(RecordingMailer::default(), Some("SB-Mid-server-key"));
        let order_id = ORDER.to_string();

        let unsigned = f.service.handle(&settlement()).await;
        assert!(matches!(unsigned, Err(AppError::InvalidSignature)));

        let forged = body(json!({
            "transaction_status": "settlement",
            "order_id": order_id,
            "status_code": "200",
            "gross_amount": "2700000.00",
            "signature_key": signature_for(&order_id, "200", "2700000.00", "wrong-key"),
        }));
        assert!(matches!(
            f.service.handle(&forged).await,
            Err(AppError::InvalidSignature)
        ));

        let signed = body(json!({
            "transaction_status": "settlement",
            "order_id": order_id,
            "status_code": "200",
            "gross_amount": "2700000.00",
            "signature_key": signature_for(&order_id, "200", "2700000.00", "SB-Mid-server-key"),
        }));
        let ack = f.service.handle(&signed).await.unwrap();
        assert_eq!(ack.status, Some(PaymentStatus::Success));
    }
}
