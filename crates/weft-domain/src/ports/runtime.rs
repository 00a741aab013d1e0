//! Runtime Ports
//!
//! The handles injected into unit bodies call back into the runtime through
//! these two traits. The application layer implements both on its runtime
//! core; the domain only sees the interfaces.

use async_trait::async_trait;
use serde_json::Value;

use crate::entities::Interceptor;
use crate::error::Result;
use crate::value_objects::UnitId;

/// Entry point for invoking operations
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Invoke an operation by id
    async fn invoke(&self, operation: &UnitId, input: Value) -> Result<Value>;

    /// Wrap every subsequent invocation of `operation` with `interceptor`
    ///
    /// Interceptors are added outermost; calls already in flight keep the
    /// chain they started with.
    fn intercept(&self, operation: &UnitId, interceptor: Interceptor) -> Result<()>;
}

/// Entry point for publishing notifications
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` and wait for every interested listener to finish
    async fn publish(&self, notification: &UnitId, payload: Value) -> Result<()>;
}
