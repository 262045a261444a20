//! Delivery queue for reconciliation.
//!
//! This module provides an ordered queue of storage tokens with:
//! - FIFO ordering matching the local index
//! - In-flight tracking (token handed out but not yet acknowledged)
//! - A per-token attempt budget
//!
//! A negatively acknowledged token goes back to the *front* of the queue,
//! so retries never reorder delivery. Tokens that run out of attempts are
//! parked as exhausted.

use crate::delivery::retry_backoff;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// What to do after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nack {
    /// Try again after `delay`; `attempt` is the upcoming attempt number.
    Retry {
        /// The upcoming attempt number (1-based).
        attempt: u32,
        /// Wait before retrying.
        delay: Duration,
    },
    /// Attempt budget spent; the token is parked.
    Exhausted,
}

/// Ordered delivery queue with attempt tracking.
///
/// Tokens flow through the outbox in this order:
/// 1. `new()` - queue tokens in index order
/// 2. `next()` - take the front token, counting an attempt
/// 3. `ack()` on success, or `nack()` to retry or park it
#[derive(Debug)]
pub struct Outbox {
    max_attempts: u32,
    queue: VecDeque<String>,
    attempts: HashMap<String, u32>,
    in_flight: Option<String>,
    exhausted: Vec<String>,
}

impl Outbox {
    /// Queue `tokens` in order with `max_attempts` tries each (at least 1).
    pub fn new<I>(tokens: I, max_attempts: u32) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            max_attempts: max_attempts.max(1),
            queue: tokens.into_iter().collect(),
            attempts: HashMap::new(),
            in_flight: None,
            exhausted: Vec::new(),
        }
    }

    /// Take the next token for delivery.
    ///
    /// Returns `None` when the queue is empty or a token is still in flight.
    pub fn next(&mut self) -> Option<String> {
        if self.in_flight.is_some() {
            return None;
        }
        let token = self.queue.pop_front()?;
        *self.attempts.entry(token.clone()).or_insert(0) += 1;
        self.in_flight = Some(token.clone());
        Some(token)
    }

    /// Delivery of the in-flight token succeeded.
    pub fn ack(&mut self, token: &str) {
        if self.in_flight.as_deref() == Some(token) {
            self.in_flight = None;
            self.attempts.remove(token);
        }
    }

    /// Delivery of the in-flight token failed.
    pub fn nack(&mut self, token: &str) -> Nack {
        if self.in_flight.as_deref() != Some(token) {
            return Nack::Exhausted;
        }
        self.in_flight = None;
        let used = self.attempts(token);
        if used >= self.max_attempts {
            self.attempts.remove(token);
            self.exhausted.push(token.to_string());
            Nack::Exhausted
        } else {
            self.queue.push_front(token.to_string());
            Nack::Retry {
                attempt: used + 1,
                delay: retry_backoff(used),
            }
        }
    }

    /// Attempts made so far for `token`.
    pub fn attempts(&self, token: &str) -> u32 {
        self.attempts.get(token).copied().unwrap_or(0)
    }

    /// Number of tokens waiting (not including the in-flight one).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tokens that ran out of attempts, in the order they gave up.
    pub fn exhausted(&self) -> &[String] {
        &self.exhausted
    }
}
