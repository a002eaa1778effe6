//! Retrying control plane calls with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use tracing::{debug, warn};

/// Backoff settings for retried control plane calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap for exponential growth
    pub max_delay: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            max_retries: 5,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
///
/// # Example
/// ```ignore
/// retry_with_backoff(
///     &RetryConfig::default(),
///     "delete namespace",
///     || cluster.delete_namespace("k8s-dnsperf"),
///     ClusterError::is_retryable,
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    config: &RetryConfig,
    operation: &str,
    mut op: F,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_max_times(config.max_retries)
        .with_jitter()
        .build();

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(operation, attempts, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if is_retryable(&e) => match delays.next() {
                Some(delay) => {
                    warn!(
                        operation,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(operation, attempts, error = %e, "Giving up after retries");
                    return Err(e);
                }
            },
            Err(e) => return Err(e),
        }
    }
}
