// Backoff for transient catalog fetch failures
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How hard the client tries before giving up on a request
///
/// The storefront fetches its catalog once per session and shows an error
/// if that fails, so the default is a single attempt. Retries are opt-in.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Same backoff curve, different retry budget
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay_ms = self.initial_delay_ms as f64;
        for _ in 1..attempt {
            delay_ms *= self.backoff_multiplier;
            if delay_ms >= self.max_delay_ms as f64 {
                break;
            }
        }
        Duration::from_millis((delay_ms as u64).min(self.max_delay_ms))
    }
}

/// Run `operation` until it succeeds, the error is not retryable, or the
/// retry budget is spent.
pub async fn with_retry<F, Fut, T, E, R>(
    config: &RetryConfig,
    should_retry: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Request succeeded after {} retries", attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                attempt += 1;

                if attempt > config.max_retries || !should_retry(&err) {
                    if config.max_retries > 0 {
                        warn!("Giving up after {} attempt(s): {}", attempt, err);
                    }
                    return Err(err);
                }

                let delay = config.delay_for(attempt);
                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {}ms...",
                    attempt,
                    config.max_retries,
                    err,
                    delay.as_millis()
                );

                sleep(delay).await;
            }
        }
    }
}

/// Statuses worth another attempt: server errors, throttling and timeouts
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error()
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
}
