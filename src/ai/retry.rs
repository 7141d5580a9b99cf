//! Retry utilities with exponential backoff.

use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with specified parameters
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Why `with_retry` gave up
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error ended the loop early
    Aborted(E),
}

/// Execute an async operation with exponential backoff retry.
///
/// Errors for which `should_retry` returns false end the loop immediately.
/// Retryable errors are retried until `config.max_attempts` attempts have been
/// made, with exponentially increasing delays (capped at `config.max_delay`).
///
/// # Example
/// ```ignore
/// let result = with_retry(&config, |e: &MyError| e.is_transient(), || async {
///     some_fallible_operation().await
/// }).await;
/// ```
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if !should_retry(&e) {
                    return Err(RetryError::Aborted(e));
                }
                if attempts >= config.max_attempts {
                    return Err(RetryError::Exhausted { attempts, last: e });
                }

                let delay = config.delay_after(attempts);
                tracing::warn!(
                    "Operation failed (attempt {}/{}): {}. Retrying in {:?}...",
                    attempts,
                    config.max_attempts,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}
