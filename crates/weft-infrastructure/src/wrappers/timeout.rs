//! Timeout wrapper

use std::time::Duration;

use tracing::warn;
use weft_domain::entities::WrapperDefinition;
use weft_domain::error::Error;
use weft_domain::value_objects::UnitId;

/// Operation wrapper that fails with `Timeout` when the inner chain takes
/// longer than `limit`
///
/// The inner future is dropped on expiry, so whatever it was awaiting is
/// cancelled.
pub fn timeout(id: impl Into<UnitId>, limit: Duration) -> WrapperDefinition {
    let elapsed_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
    WrapperDefinition::for_operations(id, move |input, next, ctx| async move {
        match tokio::time::timeout(limit, next.run(input)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation = %ctx.target, elapsed_ms, "Operation timed out");
                Err(Error::Timeout {
                    unit: ctx.target,
                    elapsed_ms,
                })
            }
        }
    })
    .described(format!("Fails calls that take longer than {elapsed_ms}ms"))
}
