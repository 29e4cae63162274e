//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They talk to the repositories and to the outside world (payment gateway,
//! SMTP relay, local upload directory).

pub mod mailer;
pub mod notification_service;
pub mod payment_gateway;
pub mod retry;
pub mod transaction_id;
pub mod transaction_service;
pub mod upload;
