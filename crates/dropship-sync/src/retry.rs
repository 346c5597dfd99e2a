//! Bounded retry with linear backoff for external calls.
//!
//! Every network step of the pipeline goes through [`retry_with_backoff`].
//! Errors are classified through [`Transient`]: timeouts, connection
//! failures, HTTP 429 and HTTP 5xx are retried; anything else fails the same
//! way on every attempt and is returned after the first one.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use dropship_core::AppConfig;
use dropship_marketplace::MarketplaceError;
use dropship_supplier::SupplierError;

/// Classifies an error as worth retrying.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for SupplierError {
    fn is_transient(&self) -> bool {
        SupplierError::is_transient(self)
    }
}

impl Transient for MarketplaceError {
    fn is_transient(&self) -> bool {
        MarketplaceError::is_transient(self)
    }
}

/// Attempt budget and backoff base for one retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below one are raised to one.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.retry_backoff_secs),
        )
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (1-based): `backoff_base × attempt`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// The last error of a retried call, with the number of attempts made.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub operation: &'static str,
    pub attempts: u32,
    pub source: E,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.operation, self.attempts, self.source
        )
    }
}

impl<E> std::error::Error for Exhausted<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or
/// `policy.max_attempts()` attempts have been made.
///
/// After failed attempt *n* the executor sleeps `backoff_base × n`. Each
/// failed attempt is logged at `warn`; giving up is logged at `error`.
///
/// | Attempt (base = 2 s) | Sleep before next attempt |
/// |----------------------|---------------------------|
/// | 1                    | 2 s                       |
/// | 2                    | 4 s                       |
/// | 3 (of 3)             | none, error returned      |
///
/// # Errors
///
/// Returns [`Exhausted`] carrying the last error and the attempt count.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1u32;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let transient = err.is_transient();
        tracing::warn!(
            operation,
            attempt,
            max_attempts,
            transient,
            error = %err,
            "attempt failed"
        );

        if !transient || attempt >= max_attempts {
            tracing::error!(
                operation,
                attempts = attempt,
                error = %err,
                "giving up"
            );
            return Err(Exhausted {
                operation,
                attempts: attempt,
                source: err,
            });
        }

        tokio::time::sleep(policy.delay_after(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
