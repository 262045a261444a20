//! Delivery policy for replaying queued mutations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempts per entry when `Acknowledged` is configured without a count.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How reconciliation treats the outcome of each remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// One attempt per entry; the local entry is removed whatever the
    /// remote outcome. At-most-once: a failed call loses the mutation.
    #[default]
    BestEffort,
    /// Outbox semantics: the local entry is removed only after the remote
    /// call succeeds. Failed calls are retried up to `max_attempts`, then
    /// left dirty for the next pass.
    Acknowledged {
        /// Attempts per entry per pass (at least 1).
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl DeliveryPolicy {
    /// Outbox policy with the given attempt budget.
    pub fn acknowledged(max_attempts: u32) -> Self {
        Self::Acknowledged { max_attempts }
    }

    /// Attempts allowed per entry in one pass.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::BestEffort => 1,
            Self::Acknowledged { max_attempts } => (*max_attempts).max(1),
        }
    }

    /// Whether a failed entry is dropped from the local store anyway.
    pub fn drops_failed(&self) -> bool {
        matches!(self, Self::BestEffort)
    }
}

/// Calculate the wait before retry number `attempt` (1-based).
///
/// Formula: min(5s, 100ms * 2^(attempt-1)) + random(0..250ms)
pub fn retry_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let base_ms = (100u64 << exponent).min(5_000);
    Duration::from_millis(base_ms + random_jitter_ms())
}

/// Generate random jitter between 0 and 250 milliseconds.
fn random_jitter_ms() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes) % 251,
        Err(_) => 0,
    }
}
