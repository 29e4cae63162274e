//! User records.
//!
//! Users are owned by the identity service. This crate only reads the name
//! and email joined onto transactions.

use serde::Serialize;

/// The subset of a user shown alongside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub fullname: String,
    pub email: String,
}
