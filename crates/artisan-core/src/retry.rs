//! Retry policy: bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::ErrorKind;

/// Why a retried call ultimately did not produce a value.
#[derive(Debug, Error)]
pub enum RetryError<E: std::fmt::Display> {
    /// Every allowed invocation failed transiently.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// A failure was classified permanent; no further attempt was made.
    #[error("permanent failure on attempt {attempts}: {error}")]
    Permanent { attempts: u32, error: E },

    /// The deadline or a manual abort interrupted the wait between retries.
    #[error("cancelled while retrying")]
    Cancelled,
}

/// Retry policy for a single fallible, potentially slow call.
///
/// Delay for attempt `n` is `base_delay * multiplier^(n - 1)`, capped at
/// `max_delay`, with optional jitter to spread synchronized retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first invocation (total calls = 1 + max_retries).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential growth.
    pub multiplier: f64,

    /// Upper cap on any single delay.
    pub max_delay: Duration,

    /// Add up to 10% uniform jitter to each delay.
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            multiplier: 2.0,
            max_delay,
            jitter: false,
        }
    }

    /// Delay before the retry following the `attempts`-th failed invocation.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let mut delay_secs = base_secs * self.multiplier.powi(attempts.saturating_sub(1) as i32);
        if self.jitter {
            delay_secs *= 1.0 + rand::thread_rng().gen_range(0.0..0.1);
        }
        // Cap in float space: the uncapped product overflows Duration for
        // large attempt counts, and from_secs_f64 panics on overflow.
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    /// Drive `call` until it succeeds, a failure is classified permanent,
    /// retries are exhausted, or the token fires.
    ///
    /// `call` receives the 1-indexed invocation number. `classify` maps an
    /// error to transient/permanent; the policy itself has no opinion on
    /// what any particular error means. Backoff sleeps race the token and
    /// abort immediately on cancellation.
    pub async fn run<T, E, F, Fut, C>(
        &self,
        cancel: &CancellationToken,
        classify: C,
        mut call: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorKind,
    {
        let max_invocations = self.max_retries + 1;
        let mut attempt = 1u32;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            let error = match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if classify(&error) == ErrorKind::Permanent {
                return Err(RetryError::Permanent {
                    attempts: attempt,
                    error,
                });
            }
            if attempt >= max_invocations {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.next_delay(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "transient failure, backing off");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
