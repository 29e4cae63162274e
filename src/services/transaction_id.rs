//! Transaction id allocation.
//!
//! Ids double as the payment gateway's order id. They are taken from the
//! current Unix timestamp so they read as creation times; on collision the
//! generator backs off and tries the clock again, then falls back to random
//! 63-bit ids.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppError, repositories::TransactionRepository, services::retry::RetryPolicy,
};

/// Source of the candidate id, seconds since the Unix epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Attempts at a random id after the clock-based ones ran out.
const RANDOM_ATTEMPTS: u32 = 3;

/// Picks ids that are unused at the time of the check.
///
/// Two concurrent callers can still pick the same id; the insert then fails
/// on the primary key with [`AppError::DuplicateTransaction`].
#[derive(Clone)]
pub struct TransactionIdGenerator {
    clock: Clock,
    policy: RetryPolicy,
}

impl TransactionIdGenerator {
    pub fn new(clock: Clock, policy: RetryPolicy) -> Self {
        Self { clock, policy }
    }

    /// Wall-clock seconds, three timestamp attempts with 500 ms base backoff.
    pub fn system() -> Self {
        Self::new(
            Arc::new(|| chrono::Utc::now().timestamp()),
            RetryPolicy::new(3, std::time::Duration::from_millis(500)),
        )
    }

    /// Find an id that no stored transaction uses.
    ///
    /// # Errors
    ///
    /// - `Database`: the availability check failed
    /// - `DuplicateTransaction`: every candidate, random ones included, was taken
    pub async fn next_id(&self, transactions: &dyn TransactionRepository) -> Result<i64, AppError> {
        for attempt in 0..self.policy.attempts {
            let candidate = (self.clock)();
            if !transactions.exists(candidate).await? {
                return Ok(candidate);
            }

            tracing::debug!(candidate, attempt, "transaction id already taken");
            if attempt + 1 < self.policy.attempts {
                self.policy.wait_after(attempt).await;
            }
        }

        let mut last = 0;
        for _ in 0..RANDOM_ATTEMPTS {
            last = random_id();
            if !transactions.exists(last).await? {
                tracing::info!(id = last, "timestamp ids exhausted, using random id");
                return Ok(last);
            }
        }

        Err(AppError::DuplicateTransaction(last))
    }
}

/// Positive 63-bit id from the random bits of a v4 UUID.
fn random_id() -> i64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    let id = (high & i64::MAX as u64) as i64;
    // Zero is never a valid id
    id.max(1)
}
