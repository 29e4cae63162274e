//! Booking service - creates transactions and their payment sessions.
//!
//! This service handles:
//! - Request validation
//! - Transaction id allocation
//! - Persisting the booking
//! - Opening a checkout session with the payment gateway
//!
//! # Consistency
//!
//! The booking is committed before the gateway is called. If the gateway
//! fails the transaction stays `pending` and the caller gets a 502 naming the
//! order id. Sending the same request again finds that pending booking by
//! its [`BookingKey`](crate::models::transaction::BookingKey) and reopens
//! checkout for the existing order id instead of booking twice.

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppError,
    models::transaction::{CreateTransactionRequest, NewTransaction, TransactionDetails},
    repositories::{HouseRepository, TransactionRepository},
    services::{
        payment_gateway::{CheckoutRequest, PaymentGateway},
        transaction_id::TransactionIdGenerator,
    },
};

#[derive(Clone)]
pub struct BookingService {
    houses: Arc<dyn HouseRepository>,
    transactions: Arc<dyn TransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    ids: TransactionIdGenerator,
}

impl BookingService {
    pub fn new(
        houses: Arc<dyn HouseRepository>,
        transactions: Arc<dyn TransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        ids: TransactionIdGenerator,
    ) -> Self {
        Self {
            houses,
            transactions,
            gateway,
            ids,
        }
    }

    /// Create a booking and return the gateway's checkout session unmodified.
    ///
    /// # Process
    ///
    /// 1. Validate the request
    /// 2. Check that the house exists
    /// 3. Reuse a pending booking for the same stay, or else allocate an
    ///    unused id, insert the transaction and re-read it joined with house
    ///    and user
    /// 4. Request a checkout session for it
    ///
    /// # Errors
    ///
    /// - `Validation`: invalid request, or unknown user
    /// - `HouseNotFound`: `house_id` does not exist
    /// - `DuplicateTransaction`: a concurrent request took the same id
    /// - `PaymentGateway`: the session could not be created
    /// - `Database`: database error occurred
    pub async fn create(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<serde_json::Value, AppError> {
        request.validate()?;

        if self.houses.get(request.house_id).await?.is_none() {
            return Err(AppError::HouseNotFound);
        }

        let details = match self.transactions.find_pending(&request.booking_key()).await? {
            Some(pending) => {
                tracing::info!(
                    transaction_id = pending.transaction.id,
                    "reopening checkout for pending booking"
                );
                pending
            }
            None => self.book(request).await?,
        };
        let order_id = details.transaction.id;

        let checkout = CheckoutRequest::new(
            details.transaction.id,
            details.transaction.total,
            &details.user_fullname,
            &details.user_email,
        );

        match self.gateway.create_checkout(&checkout).await {
            Ok(session) => {
                tracing::info!(transaction_id = order_id, "checkout session created");
                Ok(session)
            }
            Err(e) => {
                tracing::error!(transaction_id = order_id, "payment gateway error: {e}");
                Err(AppError::PaymentGateway(format!(
                    "Payment gateway unavailable for order {order_id}, please retry"
                )))
            }
        }
    }

    /// Insert a new transaction and read it back with its house and user.
    async fn book(&self, request: CreateTransactionRequest) -> Result<TransactionDetails, AppError> {
        let id = self.ids.next_id(self.transactions.as_ref()).await?;
        let created = self
            .transactions
            .create(NewTransaction::from_request(id, request))
            .await?;

        self.transactions
            .get(created.id)
            .await?
            .ok_or(AppError::TransactionNotFound)
    }
}
