//! Retry wrapper

use std::time::Duration;

use tracing::{debug, warn};
use weft_domain::entities::WrapperDefinition;
use weft_domain::error::ErrorChain;
use weft_domain::value_objects::UnitId;

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first call
    pub attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Operation wrapper that calls `next` up to `attempts` times
///
/// Every attempt receives the original input. The last error is returned
/// unchanged once attempts run out. `attempts` below 1 is treated as 1.
pub fn retry(id: impl Into<UnitId>, attempts: u32, backoff: Duration) -> WrapperDefinition {
    let policy = RetryPolicy {
        attempts: attempts.max(1),
        backoff,
    };
    WrapperDefinition::for_operations(id, move |input, next, ctx| async move {
        let mut attempt = 1;
        loop {
            match next.run(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(err) if attempt < policy.attempts => {
                    let delay = policy.delay_after(attempt);
                    debug!(
                        operation = %ctx.target,
                        attempt,
                        delay = ?delay,
                        error = %ErrorChain(&err),
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(operation = %ctx.target, attempts = attempt, "Retries exhausted");
                    return Err(err);
                }
            }
        }
    })
    .described(format!(
        "Retries up to {} times with {}ms linear backoff",
        policy.attempts,
        policy.backoff.as_millis()
    ))
}
