//! Persistence ports and their PostgreSQL adapters.
//!
//! Handlers and services only see the traits, so tests can run them against
//! in-memory implementations.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        house::{House, NewHouse},
        notification::NotificationEvent,
        transaction::{BookingKey, NewTransaction, PaymentStatus, Transaction, TransactionDetails},
    },
};

/// PostgreSQL house repository
pub mod house_repository;
/// PostgreSQL transaction repository
pub mod transaction_repository;

pub use house_repository::PgHouseRepository;
pub use transaction_repository::PgTransactionRepository;

/// Outcome of [`TransactionRepository::update_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The stored status differed and was overwritten.
    Changed,
    /// The transaction already had this status.
    Unchanged,
    /// No transaction has this id.
    Missing,
}

/// Storage for house listings.
#[async_trait]
pub trait HouseRepository: Send + Sync {
    /// All houses, newest first.
    async fn list(&self) -> Result<Vec<House>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<House>, AppError>;

    async fn create(&self, house: NewHouse) -> Result<House, AppError>;

    /// Write every column of `house` back to its row.
    async fn update(&self, house: &House) -> Result<House, AppError>;

    /// Delete and return the removed row, `None` if it did not exist.
    async fn delete(&self, id: i64) -> Result<Option<House>, AppError>;
}

/// Storage for bookings and their notification history.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;

    /// All transactions joined with house and user, newest first.
    async fn list(&self) -> Result<Vec<TransactionDetails>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<TransactionDetails>, AppError>;

    async fn exists(&self, id: i64) -> Result<bool, AppError>;

    /// Most recent `pending` transaction for the same stay, if any.
    async fn find_pending(&self, key: &BookingKey) -> Result<Option<TransactionDetails>, AppError>;

    /// Insert a transaction.
    ///
    /// Fails with [`AppError::DuplicateTransaction`] if the id is taken.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, AppError>;

    /// Write `status` only if the stored one differs.
    ///
    /// The check and the write are a single atomic step, so of several
    /// concurrent callers with the same status exactly one sees
    /// [`StatusUpdate::Changed`].
    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<StatusUpdate, AppError>;

    /// Delete and return the removed row, `None` if it did not exist.
    async fn delete(&self, id: i64) -> Result<Option<Transaction>, AppError>;

    async fn record_notification(&self, event: NotificationEvent) -> Result<(), AppError>;
}
