//! Process lifecycle
//!
//! [`RuntimeHandle`] is what a host holds after a successful start:
//!
//! ```text
//!  RuntimeBuilder::start ──► RuntimeHandle ──► invoke / publish / intercept
//!                                  │
//!                                  ├─ stop(): weft.stopping ─► teardown ─► signal
//!                                  └─ wait_for_shutdown(): resolves after stop
//! ```
//!
//! `stop` is idempotent. Concurrent callers wait for the first one to finish
//! and then return `Ok(())`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use weft_application::runtime::RuntimeCore;
use weft_domain::constants::STOPPING_NOTIFICATION;
use weft_domain::entities::Interceptor;
use weft_domain::error::{AggregateDisposeError, Error, ErrorChain, Result};
use weft_domain::ports::{Invoker, Publisher};
use weft_domain::value_objects::{DiscoverySnapshot, RegistrySnapshot, UnitId};

// ============================================================================
// Shutdown Coordinator
// ============================================================================

/// Shutdown signal shared between the handle and anything waiting on it
///
/// An `AtomicBool` answers "already shut down?" without locking; a tokio
/// `Notify` wakes every waiter once.
pub struct ShutdownCoordinator {
    /// Shutdown signal flag
    shutdown_signal: AtomicBool,
    /// Notification channel for async waiting
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        Self {
            shutdown_signal: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Mark shutdown complete and wake every waiter
    pub fn signal_shutdown(&self) {
        info!("Shutdown signal received");
        self.shutdown_signal.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether shutdown has been signalled
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }

    /// Wait until `signal_shutdown()` has been called
    pub async fn wait_for_shutdown(&self) {
        // Register before checking the flag so a concurrent signal is not missed
        let notified = self.notify.notified();
        if self.is_shutting_down() {
            return;
        }
        notified.await;
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("is_shutting_down", &self.is_shutting_down())
            .finish()
    }
}

// ============================================================================
// Runtime Handle
// ============================================================================

/// A started runtime
pub struct RuntimeHandle {
    core: Arc<RuntimeCore>,
    shutdown: Arc<ShutdownCoordinator>,
    stop_requested: AtomicBool,
    lifecycle_notifications: bool,
}

impl RuntimeHandle {
    pub(crate) fn new(core: Arc<RuntimeCore>, lifecycle_notifications: bool) -> Self {
        Self {
            core,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            stop_requested: AtomicBool::new(false),
            lifecycle_notifications,
        }
    }

    /// Invoke an operation
    pub async fn invoke(&self, operation: &str, input: Value) -> Result<Value> {
        self.core.invoke(&UnitId::from(operation), input).await
    }

    /// Invoke an operation with typed input and output
    pub async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let output = self.invoke(operation, serde_json::to_value(input)?).await?;
        Ok(serde_json::from_value(output)?)
    }

    /// Publish a notification and wait for its listeners
    pub async fn publish(&self, notification: &str, payload: Value) -> Result<()> {
        self.core
            .publish(&UnitId::from(notification), payload)
            .await
    }

    /// Intercept every subsequent invocation of `operation`
    pub fn intercept(&self, operation: &str, interceptor: Interceptor) -> Result<()> {
        self.core.intercept(&UnitId::from(operation), interceptor)
    }

    /// Registered operation and notification ids
    pub fn discovery(&self) -> DiscoverySnapshot {
        self.core.discovery()
    }

    /// Diagnostics view of the registry and graph
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.core.snapshot()
    }

    /// The runtime core
    pub fn core(&self) -> &Arc<RuntimeCore> {
        &self.core
    }

    /// Shared shutdown coordinator
    pub fn shutdown_coordinator(&self) -> Arc<ShutdownCoordinator> {
        Arc::clone(&self.shutdown)
    }

    /// Whether the runtime still accepts calls
    pub fn is_running(&self) -> bool {
        !self.core.is_stopped()
    }

    /// Resolve once [`RuntimeHandle::stop`] has finished
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.wait_for_shutdown().await;
    }

    /// Publish `weft.stopping`, then tear everything down in reverse order
    ///
    /// Listener and disposer failures are collected into one
    /// `Error::Dispose`; teardown always runs to the end.
    pub async fn stop(&self) -> Result<()> {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            self.shutdown.wait_for_shutdown().await;
            return Ok(());
        }
        info!("Stopping runtime");

        let mut failures = AggregateDisposeError::default();
        let stopping = UnitId::from(STOPPING_NOTIFICATION);
        let announced = if self.lifecycle_notifications {
            self.core.publish(&stopping, Value::Null).await
        } else {
            Ok(())
        };
        if let Err(err) = announced {
            warn!(error = %ErrorChain(&err), "Stopping listener failed");
            failures.push(stopping, err);
        }
        failures.failures.extend(self.core.teardown().await.failures);
        self.shutdown.signal_shutdown();

        if failures.is_empty() {
            info!("Runtime stopped");
            Ok(())
        } else {
            error!(failures = failures.failures.len(), "Runtime stopped with teardown failures");
            Err(Error::Dispose(failures))
        }
    }

    /// Run until Ctrl-C or until another caller stops the runtime
    pub async fn run_until_signal(&self) -> Result<()> {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    error!("Failed to listen for shutdown signal: {}", err);
                }
                info!("Received shutdown signal, stopping runtime");
                self.stop().await
            }
            () = self.wait_for_shutdown() => Ok(()),
        }
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("running", &self.is_running())
            .field("units", &self.core.graph().registry().len())
            .finish()
    }
}
