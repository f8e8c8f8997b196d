use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::errors::CoreError;

/// Exponential-backoff retry policy applied around quote source calls.
///
/// The delay schedule is `base * 2^attempt + jitter`, with jitter drawn
/// uniformly from [0, 1) seconds. `delay_for` is separate from the async
/// runner so the schedule can be tested without sleeping.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before re-running after the given failed attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(backoff + rand::random::<f64>())
    }

    /// Run `operation` up to `max_attempts` times, sleeping between
    /// attempts. The last error is returned once attempts are exhausted.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts.max(1) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt - 1);
                    debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after failed attempt"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}
