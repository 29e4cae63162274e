//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, multipart form, URL params)
//! 2. Delegates to a repository or service
//! 3. Returns the `{code, data}` envelope, or an `AppError`

/// Service health endpoint
pub mod health;
/// House listing endpoints
pub mod houses;
/// Payment gateway webhook
pub mod notifications;
/// Booking endpoints
pub mod transactions;
