//! Payment gateway client.
//!
//! Creates hosted checkout sessions (Midtrans Snap) for new bookings. The
//! client is constructed once in `main` with the server key and handed to the
//! booking service, there is no process-wide gateway configuration.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Errors from the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Connection failed, timed out, or the response could not be read.
    #[error("payment gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Gateway answered with a non-success status.
    #[error("payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Body of a checkout session request.
///
/// # JSON Example
///
/// ```json
/// {
///   "transaction_details": { "order_id": "1735689600", "gross_amount": 2700000 },
///   "credit_card": { "secure": true },
///   "customer_details": { "first_name": "Ayu Lestari", "email": "ayu@example.com" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    pub transaction_details: OrderDetails,
    pub credit_card: CreditCardOptions,
    pub customer_details: CustomerDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditCardOptions {
    /// Require 3-D Secure for card payments
    pub secure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
}

impl CheckoutRequest {
    pub fn new(order_id: i64, gross_amount: i64, customer_name: &str, customer_email: &str) -> Self {
        Self {
            transaction_details: OrderDetails {
                order_id: order_id.to_string(),
                gross_amount,
            },
            credit_card: CreditCardOptions { secure: true },
            customer_details: CustomerDetails {
                first_name: customer_name.to_string(),
                email: customer_email.to_string(),
            },
        }
    }
}

/// Creates checkout sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a hosted checkout session.
    ///
    /// The gateway's response body is returned as-is (for Snap:
    /// `{"token": ..., "redirect_url": ...}`).
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<serde_json::Value, GatewayError>;
}

/// [`PaymentGateway`] speaking the Snap HTTP API.
#[derive(Debug, Clone)]
pub struct SnapGateway {
    http: reqwest::Client,
    base_url: String,
    server_key: String,
}

impl SnapGateway {
    /// Build a client for `base_url` (no trailing slash) authenticating with
    /// `server_key`.
    pub fn new(
        base_url: impl Into<String>,
        server_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            server_key: server_key.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<serde_json::Value, GatewayError> {
        let response = self
            .http
            .post(format!("{}/snap/v1/transactions", self.base_url))
            .header("Accept", "application/json")
            // Server key as username, empty password
            .basic_auth(&self.server_key, Some(""))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<serde_json::Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_request_matches_snap_schema() {
        let request = CheckoutRequest::new(1_735_689_600, 2_700_000, "Ayu Lestari", "ayu@example.com");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "transaction_details": { "order_id": "1735689600", "gross_amount": 2700000 },
                "credit_card": { "secure": true },
                "customer_details": { "first_name": "Ayu Lestari", "email": "ayu@example.com" }
            })
        );
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let gateway =
            SnapGateway::new("http://127.0.0.1:9", "SB-Mid-server-key", Duration::from_secs(2))
                .unwrap();
        let request = CheckoutRequest::new(1, 100, "A", "a@example.com");

        assert!(matches!(
            gateway.create_checkout(&request).await,
            Err(GatewayError::Transport(_))
        ));
    }
}
