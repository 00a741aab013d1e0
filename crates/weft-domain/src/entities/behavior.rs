//! Behaviour function types
//!
//! Every unit body is an async closure boxed behind an `Arc` so definitions
//! stay cheap to clone and can be shared between the registry, the composer
//! and in-flight invocations.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::dependencies::Dependencies;
use crate::error::Result;
use crate::value_objects::{UnitId, UnitKind};

/// Live value of a constructed singleton
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Context handed to constructors, disposers, operations and listeners
#[derive(Clone)]
pub struct UnitContext {
    /// The unit being run
    pub unit: UnitId,
    /// The unit's validated configuration
    pub config: Value,
    /// The unit's resolved dependencies
    pub deps: Dependencies,
}

impl fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContext")
            .field("unit", &self.unit)
            .field("config", &self.config)
            .field("deps", &self.deps.names())
            .finish()
    }
}

/// Context handed to a wrapper on every call
#[derive(Clone)]
pub struct WrapperContext {
    /// The wrapper itself
    pub wrapper: UnitId,
    /// The unit being wrapped
    pub target: UnitId,
    /// Kind of the unit being wrapped
    pub target_kind: UnitKind,
    /// The wrapper's validated configuration
    pub config: Value,
    /// The wrapper's resolved dependencies
    pub deps: Dependencies,
}

/// The remainder of a composed chain
///
/// Calling [`Next::run`] runs the next wrapper inward, ending in the unit's
/// own logic. A wrapper may call it zero times (short-circuit) or several
/// times; each call re-runs the whole inner chain.
pub struct Next<O> {
    inner: Arc<dyn Fn(Value) -> BoxFuture<'static, Result<O>> + Send + Sync>,
}

impl<O> Clone for Next<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Send + 'static> Next<O> {
    /// Wrap an async closure as the remainder of a chain
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |input| f(input).boxed()),
        }
    }

    /// Run the inner chain with `input`
    pub fn run(&self, input: Value) -> BoxFuture<'static, Result<O>> {
        (self.inner)(input)
    }
}

impl<O> fmt::Debug for Next<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// Singleton constructor
pub type InitFn = Arc<dyn Fn(UnitContext) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// Singleton disposer
pub type DisposeFn =
    Arc<dyn Fn(Instance, UnitContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Operation body
pub type RunFn = Arc<dyn Fn(Value, UnitContext) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Listener body
pub type ListenFn =
    Arc<dyn Fn(super::Delivery, UnitContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wrapper body; `O` is `Value` for operations and [`Instance`] for singletons
pub type WrapFn<O> =
    Arc<dyn Fn(Value, Next<O>, WrapperContext) -> BoxFuture<'static, Result<O>> + Send + Sync>;

/// Post-construction interceptor registered against an operation
pub type Interceptor =
    Arc<dyn Fn(Value, Next<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Box an async closure as an [`Interceptor`]
pub fn interceptor<F, Fut>(f: F) -> Interceptor
where
    F: Fn(Value, Next<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |input, next| f(input, next).boxed())
}
