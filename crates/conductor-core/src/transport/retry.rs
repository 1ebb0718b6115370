//! Retry policy: how many extra attempts, how long to wait, and which
//! outcomes deserve another try.

use std::time::Duration;

use super::request::HttpResponse;
use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `base`, `2*base`, `4*base`, ... capped at `max`
    Exponential { base: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Fixed(Duration::from_millis(1000)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that gives up after the first attempt.
    pub fn none() -> Self {
        Self::new(0, Backoff::Fixed(Duration::ZERO))
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                base.checked_mul(factor).map_or(max, |d| d.min(max))
            }
        }
    }

    /// Connection-level failures (timeouts included) and 5xx responses are
    /// retried. Everything else is final.
    pub fn should_retry(&self, outcome: &Result<HttpResponse, TransportError>) -> bool {
        match outcome {
            Ok(response) => response.is_server_error(),
            Err(_) => true,
        }
    }
}
