//! Bounded retry for session-bound fetches
//!
//! Retries are strictly sequential: each attempt observes the outcome of the
//! previous one before the next is started. The wait between attempts goes
//! through the [`Delay`] trait so the loop can be driven without real timers.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_RETRIES, RETRY_DELAY_MS};

/// Source of the wait between attempts
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real timer backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay that returns immediately and records every requested wait
#[derive(Debug, Default)]
pub struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial attempt)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry (1.0 keeps it fixed)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_RETRIES, Duration::from_millis(RETRY_DELAY_MS))
    }
}

impl RetryConfig {
    /// Fixed interval between attempts
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay to use after `delay`, capped at `max_delay`
    fn next_delay(&self, delay: Duration) -> Duration {
        let next_ms = (delay.as_millis() as f64 * self.backoff_multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }
}

/// Retry an async operation until it succeeds, fails permanently, or the
/// retry budget runs out.
///
/// `is_retryable` decides whether an error is worth another attempt; the
/// last error is returned unchanged when the budget is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    config: &RetryConfig,
    delay: &dyn Delay,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut wait = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;

                if attempt > config.max_retries || !is_retryable(&err) {
                    return Err(err);
                }

                tracing::warn!(
                    attempt,
                    max_attempts = config.max_retries + 1,
                    error = %err,
                    "attempt failed, retrying in {:?}",
                    wait
                );

                delay.wait(wait).await;
                wait = config.next_delay(wait);
            }
        }
    }
}
