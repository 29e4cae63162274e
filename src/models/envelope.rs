//! Response envelopes shared by every endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Success wrapper: `{"code": 200, "data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `data` in a 200 envelope ready to return from a handler.
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { code: 200, data })
    }
}

/// Error wrapper: `{"code": 404, "message": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub message: String,
}
