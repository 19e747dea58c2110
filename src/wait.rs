//! Bounded polling with exponential backoff and cancellation support.
//!
//! Generic engine for waiting on a provider resource to produce a value,
//! with configurable exponential backoff, jitter, a hard deadline, and
//! cooperative cancellation. The certificate-validation poll is the one
//! caller with an unbounded provider-side duration; the deadline here turns
//! that into a typed [`ProvisionError::Timeout`] instead of a hang.

use crate::aws::error::{ProvisionError, Result};
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timing out
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Wait for a poll to produce a value.
///
/// The check returns `Ok(Some(value))` when the resource is ready,
/// `Ok(None)` to keep waiting. A check error terminates the wait
/// immediately; the deadline terminates it with [`ProvisionError::Timeout`].
///
/// # Example
/// ```ignore
/// let record = wait_for_value(
///     WaitConfig::default(),
///     Some(&cancel_token),
///     || async { certificates.validation_record(&arn).await },
///     "certificate validation record",
/// )
/// .await?;
/// ```
pub async fn wait_for_value<T, F, Fut>(
    config: WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    waiting_for: &str,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();

    loop {
        attempts += 1;

        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(ProvisionError::provider(
                    "wait",
                    format!("wait for {waiting_for} cancelled"),
                ));
            }
        }

        if start.elapsed() >= config.timeout {
            return Err(ProvisionError::Timeout {
                waiting_for: waiting_for.to_string(),
                waited: config.timeout,
            });
        }

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %waiting_for, attempts, "Resource ready");
                return Ok(value);
            }
            Ok(None) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    resource = %waiting_for,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        if let Some(token) = cancel {
                            token.cancelled().await
                        } else {
                            std::future::pending::<()>().await
                        }
                    } => {
                        return Err(ProvisionError::provider(
                            "wait",
                            format!("wait for {waiting_for} cancelled"),
                        ));
                    }
                }
            }
            Err(e) => {
                warn!(resource = %waiting_for, error = %e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_config() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn returns_value_once_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let value = wait_for_value(
            quick_config(),
            None,
            || {
                let calls = calls_clone.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                        Ok(Some("ready".to_string()))
                    } else {
                        Ok(None)
                    }
                }
            },
            "test resource",
        )
        .await
        .unwrap();

        assert_eq!(value, "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_when_never_ready() {
        let config = WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
        };

        let result: Result<String> =
            wait_for_value(config, None, || async { Ok(None) }, "never ready").await;

        let err = result.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err}");
    }

    #[tokio::test]
    async fn check_error_terminates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<String> = wait_for_value(
            quick_config(),
            None,
            || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ProvisionError::NotFound {
                        resource: "certificate",
                        id: "arn:missing".to_string(),
                    })
                }
            },
            "broken resource",
        )
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_the_wait() {
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<String> = wait_for_value(
            quick_config(),
            Some(&token),
            || async { Ok(None) },
            "cancelled resource",
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }
}
