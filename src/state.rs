//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    repositories::{HouseRepository, TransactionRepository},
    services::{
        notification_service::NotificationService, transaction_service::BookingService,
        upload::UploadStore,
    },
};

/// Everything a handler may need, built once in `main`.
///
/// Cloned per request by axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub houses: Arc<dyn HouseRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub bookings: BookingService,
    pub notifications: NotificationService,
    pub uploads: UploadStore,
}
