//! Data models representing database entities and API payloads.

/// Uniform `{code, data|message}` response wrappers
pub mod envelope;
/// House listings and the multipart form used to write them
pub mod house;
/// Payment-gateway webhook payloads and delivery records
pub mod notification;
/// Bookings and their payment status
pub mod transaction;
/// Read-only user records
pub mod user;
