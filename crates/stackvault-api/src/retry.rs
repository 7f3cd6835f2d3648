// Fixed-delay retry loop shared by every request the client issues.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Error;

/// How often, how patiently, and for which failures a request is repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one. `0` disables retrying.
    pub max_retries: u32,

    /// Pause between two attempts.
    pub delay: Duration,

    /// Retry every remote failure (including HTTP error statuses such as
    /// 404 or 401), not only transient network and server errors.
    pub retry_all_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
            retry_all_errors: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
            retry_all_errors: false,
        }
    }

    /// Whether a failure on attempt number `attempt` (0-based) gets another go.
    pub fn should_retry(&self, err: &Error, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        if self.retry_all_errors {
            err.is_remote()
        } else {
            err.is_transient()
        }
    }
}

/// Run `op` until it succeeds or the policy says to stop.
pub(crate) async fn retrying<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err, attempt) => {
                attempt += 1;
                warn!(
                    error = %err,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    "{what} failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
