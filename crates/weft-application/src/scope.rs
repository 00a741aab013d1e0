//! Scoped State Propagator
//!
//! Per-call-chain values that survive suspension points without leaking
//! between concurrently running chains.
//!
//! ## Frames
//!
//! The current frame lives in a tokio task-local. [`Scope::provide`] pushes a
//! new immutable frame chained to the current one and runs a future inside
//! it; the previous frame comes back when that future completes, errors,
//! panics or is dropped.
//!
//! ```text
//! provide(tenant = "a") ──► frame { tenant: "a" } ─┐
//!   provide(user = 7)   ──► frame { user: 7 } ─────┴─► parent
//!     Scope::current()  walks the chain to the nearest match
//! ```
//!
//! Task-locals do not follow `tokio::spawn`; use [`ScopeFrame::capture`] and
//! [`ScopeFrame::enter`] to hand the frame chain to a spawned task.
//!
//! ## Example
//!
//! ```
//! use weft_application::scope::Scope;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tenant: Scope<String> = Scope::new("tenant");
//! let seen = tenant
//!     .provide("acme".to_string(), async { tenant.current() })
//!     .await;
//! assert_eq!(seen.ok().as_deref(), Some("acme"));
//! assert!(tenant.current().is_err());
//! # }
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use weft_domain::entities::WrapperDefinition;
use weft_domain::error::{Error, Result};

tokio::task_local! {
    static CURRENT: Option<Arc<Frame>>;
}

static NEXT_SCOPE_KEY: AtomicU64 = AtomicU64::new(1);

struct Frame {
    key: u64,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Frame>>,
}

fn current_frame() -> Option<Arc<Frame>> {
    CURRENT.try_with(Clone::clone).ok().flatten()
}

/// A typed slot of scoped state
///
/// Every `Scope::new` call creates a distinct slot; clones share it.
pub struct Scope<T> {
    key: u64,
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Scope<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Scope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Scope<T> {
    /// Create a new scope slot
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: NEXT_SCOPE_KEY.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name.into()),
            _marker: PhantomData,
        }
    }

    /// Scope name, used in errors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `fut` with `value` provided for this scope
    pub async fn provide<F>(&self, value: T, fut: F) -> F::Output
    where
        F: Future,
    {
        let frame = self.push(value);
        CURRENT.scope(Some(frame), fut).await
    }

    /// Run `f` synchronously with `value` provided for this scope
    pub fn provide_sync<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        let frame = self.push(value);
        CURRENT.sync_scope(Some(frame), f)
    }

    /// Nearest provided value, or `ScopeNotAvailable`
    pub fn current(&self) -> Result<T> {
        self.try_current()
            .ok_or_else(|| Error::scope_not_available(self.name.as_ref()))
    }

    /// Nearest provided value, if any
    pub fn try_current(&self) -> Option<T> {
        let mut frame = current_frame();
        while let Some(f) = frame {
            if f.key == self.key {
                return f.value.downcast_ref::<T>().cloned();
            }
            frame = f.parent.clone();
        }
        None
    }

    /// Whether a value is provided in the current call chain
    pub fn is_provided(&self) -> bool {
        self.try_current().is_some()
    }

    /// Operation wrapper that fails with `ScopeNotAvailable` unless this
    /// scope is provided, registered as `<name>.required`
    pub fn required(&self) -> WrapperDefinition {
        let scope = self.clone();
        WrapperDefinition::for_operations(format!("{}.required", self.name), move |input, next, _ctx| {
            let scope = scope.clone();
            async move {
                if !scope.is_provided() {
                    return Err(Error::scope_not_available(scope.name()));
                }
                next.run(input).await
            }
        })
        .described(format!("Requires the '{}' scope", self.name))
    }

    fn push(&self, value: T) -> Arc<Frame> {
        Arc::new(Frame {
            key: self.key,
            value: Arc::new(value),
            parent: current_frame(),
        })
    }
}

/// A captured frame chain, for handing scoped state to another task
#[derive(Clone, Default)]
pub struct ScopeFrame {
    frame: Option<Arc<Frame>>,
}

impl ScopeFrame {
    /// Capture the current frame chain
    pub fn capture() -> Self {
        Self {
            frame: current_frame(),
        }
    }

    /// Whether the captured chain is empty
    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }

    /// Run `fut` with the captured chain as its current frame
    pub async fn enter<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self.frame, fut).await
    }
}

impl fmt::Debug for ScopeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0_usize;
        let mut frame = self.frame.clone();
        while let Some(current) = frame {
            depth += 1;
            frame = current.parent.clone();
        }
        f.debug_struct("ScopeFrame").field("depth", &depth).finish()
    }
}
