//! Fixed-pause retry for flaky external tool runs.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How many times to run an operation and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total runs, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub pause: Duration,
    /// Name used in log lines.
    pub label: &'static str,
}

impl RetryPolicy {
    /// A second run after `pause` when the first fails transiently.
    pub fn once_after(label: &'static str, pause: Duration) -> Self {
        Self {
            max_attempts: 2,
            pause,
            label,
        }
    }
}

/// The last error seen and how many runs produced it.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails with an error `is_transient`
/// rejects, or the policy runs out of attempts.
pub async fn retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    is_transient: fn(&E) -> bool,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempts >= max_attempts || !is_transient(&error) {
            return Err(Exhausted { error, attempts });
        }

        warn!(
            label = policy.label,
            attempt = attempts,
            pause_ms = policy.pause.as_millis() as u64,
            error = %error,
            "Transient failure, retrying"
        );
        tokio::time::sleep(policy.pause).await;
    }
}
