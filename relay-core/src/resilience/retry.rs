use crate::error::RelayError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

#[async_trait]
pub trait RetryPolicy: Send + Sync + Debug {
    /// `attempt` is the number of attempts already made.
    async fn should_retry(&self, attempt: u32, error: &RelayError) -> bool;
    /// Pause after the `attempt`-th failure, before the next attempt.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Doubling backoff: `initial_delay`, `2 * initial_delay`, `4 * initial_delay`, ...
#[derive(Debug, Clone)]
pub struct ExponentialBackoffRetry {
    max_attempts: u32,
    initial_delay: Duration,
}

impl ExponentialBackoffRetry {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }
}

#[async_trait]
impl RetryPolicy for ExponentialBackoffRetry {
    async fn should_retry(&self, attempt: u32, error: &RelayError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        matches!(
            error,
            RelayError::Network(_) | RelayError::Timeout(_) | RelayError::CallbackStatus(_)
        )
    }

    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }
}

/// Runs `f` until it succeeds or `policy` declines another attempt.
/// `on_failure` sees every failed attempt (1-based) before any backoff sleep.
pub async fn retry_with_policy<F, Fut, T, L>(
    policy: &dyn RetryPolicy,
    mut f: F,
    mut on_failure: L,
) -> Result<T, RelayError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RelayError>>,
    L: FnMut(u32, &RelayError),
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                on_failure(attempt, &e);
                if !policy.should_retry(attempt, &e).await {
                    return Err(e);
                }
                tokio::time::sleep(policy.delay(attempt)).await;
            }
        }
    }
}
