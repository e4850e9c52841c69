//! Bounded retry with a fixed delay between attempts

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Runs `op` until it succeeds or the attempt budget is exhausted
///
/// The closure receives the 1-based attempt number. Every failure except the
/// last one is logged at `warn` and followed by `policy.delay`; the last
/// error is returned to the caller.
pub async fn with_retry<T, E, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    op = label,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "attempt failed; retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::warn!(
                    op = label,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "max attempts reached, giving up"
                );
                return Err(err);
            }
        }
    }
}
