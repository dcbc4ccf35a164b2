use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// How often the writer retries opening the log file before reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl WriteRetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// A single attempt; failures are reported immediately.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Short retries for transient errors such as a file briefly locked by another process.
    pub fn transient() -> Self {
        Self::new(4, Duration::from_millis(10), Duration::from_millis(200))
    }

    pub fn exponential_backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        let delay = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay.as_millis() as u64))
    }

    /// Add jitter so several loggers on one disk don't retry in lockstep
    pub fn exponential_backoff_with_jitter(&self, attempt: u32) -> Duration {
        let base_delay = self.exponential_backoff(attempt);
        let jitter_ms = rand::random::<u64>() % (base_delay.as_millis() as u64 / 4 + 1);
        base_delay + Duration::from_millis(jitter_ms)
    }

    pub async fn retry<F, T, E, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = self.exponential_backoff_with_jitter(attempt - 1);
                    warn!("Append attempt {} failed: {}; retrying in {:?}", attempt, e, delay);
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for WriteRetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
