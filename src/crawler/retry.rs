//! Fixed-delay retry policy
//!
//! Every network call in the crawler (search pages, detail pages, images)
//! runs through the same policy: a fixed number of total attempts, a constant
//! delay between failed attempts, and a timeout on each attempt.

use crate::config::RetryConfig;
use crate::FolioError;
use std::future::Future;
use std::time::Duration;

/// Retry settings applied to a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            timeout,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay(), config.timeout())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent
    ///
    /// The operation receives the 1-based attempt number. Transient errors
    /// (see [`FolioError::is_transient`]) are retried after the fixed delay;
    /// any other error is returned immediately. An attempt exceeding the
    /// timeout counts as a transient [`FolioError::Timeout`]. When every
    /// attempt fails, the error of the last attempt is returned.
    ///
    /// The delay only suspends the calling task.
    ///
    /// # Arguments
    ///
    /// * `label` - Identifies the operation in logs and timeout errors
    /// * `operation` - Produces one attempt's future
    pub async fn with_retry<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, FolioError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FolioError>>,
    {
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.timeout, operation(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(FolioError::Timeout {
                    url: label.to_string(),
                }),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => {
                    tracing::debug!("{} failed permanently: {}", label, e);
                    return Err(e);
                }
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        "{} failed after {} attempts: {}",
                        label,
                        self.max_attempts,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        self.max_attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
