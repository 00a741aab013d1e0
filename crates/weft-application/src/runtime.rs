//! Runtime core
//!
//! Wires the components together around one validated graph:
//!
//! ```text
//!                   ┌──────────────┐
//!                   │ RuntimeCore  │ implements Invoker + Publisher
//!                   └──────┬───────┘
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!  Construction      ExecutionEngine   NotificationDispatcher
//!   Scheduler              │                  │
//!        │                 ▼                  │
//!        │          WrapperComposer           │
//!        └────────► DependencyResolver ◄──────┘
//!                          │
//!                          ▼
//!                   InstanceStore
//! ```
//!
//! Handles injected into unit bodies hold a `Weak` reference back to the
//! core, so they fail with `RuntimeStopped` once it is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use weft_domain::constants::DEFAULT_MAX_DISPATCH_DEPTH;
use weft_domain::entities::Interceptor;
use weft_domain::error::{AggregateDisposeError, Error, Result};
use weft_domain::ports::{Invoker, Publisher};
use weft_domain::value_objects::{DiscoverySnapshot, RegistrySnapshot, UnitId};

use crate::composer::WrapperComposer;
use crate::dispatcher::NotificationDispatcher;
use crate::engine::ExecutionEngine;
use crate::graph::DependencyGraph;
use crate::resolver::DependencyResolver;
use crate::scheduler::{ConstructionScheduler, SchedulerPhase};
use crate::store::InstanceStore;

/// Tunables for the runtime core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreOptions {
    /// Maximum depth of nested publish calls within one call chain
    pub max_dispatch_depth: usize,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

/// The assembled runtime for one validated graph
pub struct RuntimeCore {
    graph: Arc<DependencyGraph>,
    scheduler: ConstructionScheduler,
    engine: ExecutionEngine,
    dispatcher: NotificationDispatcher,
    stopped: AtomicBool,
}

impl RuntimeCore {
    /// Assemble a core around `graph`
    pub fn new(graph: DependencyGraph, options: CoreOptions) -> Arc<Self> {
        let graph = Arc::new(graph);
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let invoker: Weak<dyn Invoker> = weak.clone();
            let publisher: Weak<dyn Publisher> = weak.clone();
            let store = Arc::new(InstanceStore::new());
            let resolver = Arc::new(DependencyResolver::new(
                Arc::clone(&graph),
                Arc::clone(&store),
                invoker,
                publisher,
            ));
            let composer = Arc::new(WrapperComposer::new(Arc::clone(&graph), store));
            Self {
                scheduler: ConstructionScheduler::new(Arc::clone(&resolver), Arc::clone(&composer)),
                engine: ExecutionEngine::new(Arc::clone(&resolver), composer),
                dispatcher: NotificationDispatcher::new(resolver, options.max_dispatch_depth),
                graph,
                stopped: AtomicBool::new(false),
            }
        })
    }

    /// Construct every singleton and wrapper
    pub async fn start(&self) -> Result<()> {
        let result = self.scheduler.construct_all().await;
        if result.is_err() {
            self.stopped.store(true, Ordering::SeqCst);
        }
        result
    }

    /// Tear everything down; later calls are no-ops
    pub async fn teardown(&self) -> AggregateDisposeError {
        self.stopped.store(true, Ordering::SeqCst);
        self.scheduler.teardown_all().await
    }

    /// Whether teardown has begun
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Scheduler phase
    pub async fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase().await
    }

    /// The validated graph
    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.graph
    }

    /// The execution engine
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// The notification dispatcher
    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Diagnostics view of the registry and graph
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.graph.snapshot()
    }

    /// Registered operation and notification ids for a transport allow-list
    pub fn discovery(&self) -> DiscoverySnapshot {
        self.snapshot().discovery()
    }
}

#[async_trait]
impl Invoker for RuntimeCore {
    async fn invoke(&self, operation: &UnitId, input: Value) -> Result<Value> {
        if self.is_stopped() {
            return Err(Error::RuntimeStopped);
        }
        self.engine.invoke(operation, input).await
    }

    fn intercept(&self, operation: &UnitId, interceptor: Interceptor) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::RuntimeStopped);
        }
        self.engine.intercept(operation, interceptor)
    }
}

#[async_trait]
impl Publisher for RuntimeCore {
    async fn publish(&self, notification: &UnitId, payload: Value) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::RuntimeStopped);
        }
        self.dispatcher.publish(notification, payload).await
    }
}

impl Drop for RuntimeCore {
    fn drop(&mut self) {
        if !self.is_stopped() {
            warn!("Runtime dropped without stop, disposers did not run");
        }
    }
}
