//! Transaction (booking) data models and API request/response types.
//!
//! This module defines:
//! - `PaymentStatus`: the stored payment state
//! - `Transaction`: Database entity representing a booking
//! - `TransactionDetails`: a transaction joined with its house and user
//! - `CreateTransactionRequest`: Request body for creating bookings
//! - `BookingKey`: what identifies a retried booking request
//! - `TransactionResponse`: Response body returned to clients

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::user::User;

/// Payment state of a booking.
///
/// Stored as the Postgres enum `payment_status`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. The id is assigned by the application
/// from the creation timestamp and doubles as the payment gateway order id.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub house_id: i64,
    pub user_id: i64,

    /// Total price of the stay, in the gateway's currency unit (IDR)
    pub total: i64,

    pub status_payment: PaymentStatus,

    /// Stored filename of a payment proof, if any
    pub attachment: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction joined with the house and user it references.
///
/// Produced by a single `JOIN` query; the house and user columns are aliased
/// with a prefix.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TransactionDetails {
    #[sqlx(flatten)]
    pub transaction: Transaction,
    pub house_name: String,
    pub house_price: i64,
    pub user_fullname: String,
    pub user_email: String,
}

impl TransactionDetails {
    pub fn user(&self) -> User {
        User {
            id: self.transaction.user_id,
            fullname: self.user_fullname.clone(),
            email: self.user_email.clone(),
        }
    }
}

/// Request body for creating a booking.
///
/// # JSON Example
///
/// ```json
/// {
///   "check_in": "2025-03-01",
///   "check_out": "2025-03-04",
///   "house_id": 3,
///   "user_id": 12,
///   "total": 2700000,
///   "status_payment": "pending"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_stay"))]
pub struct CreateTransactionRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,

    #[validate(range(min = 1, message = "house_id is required"))]
    pub house_id: i64,

    #[validate(range(min = 1, message = "user_id is required"))]
    pub user_id: i64,

    #[validate(range(min = 1, message = "total must be greater than zero"))]
    pub total: i64,

    /// Defaults to `pending` when omitted
    #[serde(default)]
    pub status_payment: PaymentStatus,

    #[serde(default)]
    pub attachment: Option<String>,
}

fn validate_stay(request: &CreateTransactionRequest) -> Result<(), ValidationError> {
    if request.check_out <= request.check_in {
        let mut error = ValidationError::new("stay");
        error.message = Some("check_out must be after check_in".into());
        return Err(error);
    }
    Ok(())
}

impl CreateTransactionRequest {
    pub fn booking_key(&self) -> BookingKey {
        BookingKey {
            house_id: self.house_id,
            user_id: self.user_id,
            check_in: self.check_in,
            check_out: self.check_out,
            total: self.total,
        }
    }
}

/// The fields that make two booking requests the same stay.
///
/// A retried request with the same key reuses the pending transaction
/// instead of booking again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingKey {
    pub house_id: i64,
    pub user_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total: i64,
}

impl BookingKey {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        transaction.house_id == self.house_id
            && transaction.user_id == self.user_id
            && transaction.check_in == self.check_in
            && transaction.check_out == self.check_out
            && transaction.total == self.total
    }
}

/// Insert payload for a transaction whose id has already been chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub house_id: i64,
    pub user_id: i64,
    pub total: i64,
    pub status_payment: PaymentStatus,
    pub attachment: Option<String>,
}

impl NewTransaction {
    pub fn from_request(id: i64, request: CreateTransactionRequest) -> Self {
        Self {
            id,
            check_in: request.check_in,
            check_out: request.check_out,
            house_id: request.house_id,
            user_id: request.user_id,
            total: request.total,
            status_payment: request.status_payment,
            attachment: request.attachment,
        }
    }
}

/// House summary embedded in [`TransactionResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct HouseSummary {
    pub id: i64,
    pub name: String,
    pub price: i64,
}

/// Response returned for transaction read and delete operations.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1735689600,
///   "check_in": "2025-03-01",
///   "check_out": "2025-03-04",
///   "house_id": 3,
///   "user_id": 12,
///   "total": 2700000,
///   "status_payment": "success",
///   "attachment": null,
///   "house": { "id": 3, "name": "Sunny Loft", "price": 900000 },
///   "user": { "id": 12, "fullname": "Ayu Lestari", "email": "ayu@example.com" },
///   "created_at": "2025-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub house_id: i64,
    pub user_id: i64,
    pub total: i64,
    pub status_payment: PaymentStatus,

    /// Public URL of the attachment
    pub attachment: Option<String>,

    pub house: HouseSummary,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl TransactionResponse {
    /// Build the response, prefixing the attachment filename with `base_url`.
    pub fn with_base_url(details: TransactionDetails, base_url: &str) -> Self {
        let user = details.user();
        let transaction = details.transaction;

        Self {
            id: transaction.id,
            check_in: transaction.check_in,
            check_out: transaction.check_out,
            house_id: transaction.house_id,
            user_id: transaction.user_id,
            total: transaction.total,
            status_payment: transaction.status_payment,
            attachment: transaction
                .attachment
                .map(|file| format!("{base_url}{file}")),
            house: HouseSummary {
                id: transaction.house_id,
                name: details.house_name,
                price: details.house_price,
            },
            user,
            created_at: transaction.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(check_in: &str, check_out: &str) -> CreateTransactionRequest {
        serde_json::from_value(json!({
            "check_in": check_in,
            "check_out": check_out,
            "house_id": 3,
            "user_id": 12,
            "total": 2_700_000
        }))
        .unwrap()
    }

    #[test]
    fn status_defaults_to_pending() {
        let request = request("2025-03-01", "2025-03-04");
        assert_eq!(request.status_payment, PaymentStatus::Pending);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn check_out_must_follow_check_in() {
        let errors = request("2025-03-04", "2025-03-04").validate().unwrap_err();
        assert!(errors.to_string().contains("check_out must be after check_in"));
    }

    #[test]
    fn zero_total_fails_validation() {
        let mut request = request("2025-03-01", "2025-03-04");
        request.total = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(json!(PaymentStatus::Success), json!("success"));
        assert_eq!(PaymentStatus::Failed.to_string(), "failed");
    }
}
