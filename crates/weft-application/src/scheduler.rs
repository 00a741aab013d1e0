//! Construction/Teardown Scheduler
//!
//! Builds singletons and wrappers in the graph's construction order and tears
//! them down in strict reverse order.
//!
//! | Phase | `construct_all` | `teardown_all` |
//! |-------|-----------------|----------------|
//! | Idle | constructs everything | no-op |
//! | Running | no-op | disposes everything |
//! | TornDown | no-op | no-op |
//!
//! A failed construction unwinds whatever was already built before
//! returning, so the scheduler ends up `TornDown` either way. Teardown never
//! stops at a failing disposer; every failure is collected.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use weft_domain::entities::{Instance, Next, UnitContext, UnitDefinition};
use weft_domain::error::{AggregateDisposeError, Error, ErrorChain, Result};
use weft_domain::value_objects::UnitId;

use crate::composer::WrapperComposer;
use crate::resolver::DependencyResolver;

/// Lifecycle phase of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Nothing constructed yet
    Idle,
    /// Every unit constructed
    Running,
    /// Teardown done (after stop or a failed start)
    TornDown,
}

#[derive(Debug)]
struct SchedulerState {
    phase: SchedulerPhase,
    constructed: Vec<UnitId>,
}

/// Constructs and tears down live instances
pub struct ConstructionScheduler {
    resolver: Arc<DependencyResolver>,
    composer: Arc<WrapperComposer>,
    state: Mutex<SchedulerState>,
}

impl ConstructionScheduler {
    /// Create a scheduler
    pub fn new(resolver: Arc<DependencyResolver>, composer: Arc<WrapperComposer>) -> Self {
        Self {
            resolver,
            composer,
            state: Mutex::new(SchedulerState {
                phase: SchedulerPhase::Idle,
                constructed: Vec::new(),
            }),
        }
    }

    /// Current phase
    pub async fn phase(&self) -> SchedulerPhase {
        self.state.lock().await.phase
    }

    /// Ids constructed so far, in construction order
    pub async fn constructed(&self) -> Vec<UnitId> {
        self.state.lock().await.constructed.clone()
    }

    /// Construct every singleton and wrapper
    ///
    /// On failure everything already constructed is torn down in reverse
    /// order and the error names the failing unit.
    pub async fn construct_all(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != SchedulerPhase::Idle {
            debug!(phase = ?state.phase, "Construction already ran, skipping");
            return Ok(());
        }

        let order = self.resolver.graph().construction_order().to_vec();
        info!(units = order.len(), "Constructing units");

        for id in order {
            if let Err(err) = self.construct(&id).await {
                warn!(unit = %id, error = %ErrorChain(&err), "Construction failed, unwinding");
                let dispose = self.unwind(&mut state).await;
                return Err(Error::Construction {
                    unit: id,
                    source: Box::new(err),
                    dispose: dispose.into_option(),
                });
            }
            state.constructed.push(id);
        }

        state.phase = SchedulerPhase::Running;
        info!(units = state.constructed.len(), "All units constructed");
        Ok(())
    }

    async fn construct(&self, id: &UnitId) -> Result<()> {
        let registry = self.resolver.graph().registry();
        match registry.get(id.as_str()) {
            Some(UnitDefinition::Wrapper(_)) => {
                let context = self.resolver.context(id)?;
                self.resolver.store().insert_wrapper(id.clone(), context);
                debug!(unit = %id, "Wrapper ready");
                Ok(())
            }
            Some(UnitDefinition::Singleton(singleton)) => {
                let context = self.resolver.context(id)?;
                let init = Arc::clone(&singleton.init);
                let base_context = context.clone();
                let base: Next<Instance> = Next::new(move |config| {
                    let context = UnitContext {
                        config,
                        ..base_context.clone()
                    };
                    init(context)
                });
                let chain = self.composer.singleton_chain(id, base)?;
                let instance = chain.run(context.config.clone()).await?;
                self.resolver.store().insert_singleton(id.clone(), instance, context);
                info!(unit = %id, "Singleton constructed");
                Ok(())
            }
            Some(other) => Err(Error::internal(format!(
                "'{id}' is a {} and is never constructed",
                other.kind()
            ))),
            None => Err(Error::internal(format!("'{id}' is not registered"))),
        }
    }

    /// Dispose every constructed unit in reverse construction order
    ///
    /// Idempotent: the second call finds nothing to dispose.
    pub async fn teardown_all(&self) -> AggregateDisposeError {
        let mut state = self.state.lock().await;
        if state.phase == SchedulerPhase::TornDown {
            debug!("Teardown already ran, skipping");
            return AggregateDisposeError::default();
        }
        self.unwind(&mut state).await
    }

    async fn unwind(&self, state: &mut SchedulerState) -> AggregateDisposeError {
        let mut failures = AggregateDisposeError::default();
        info!(units = state.constructed.len(), "Tearing down units");

        while let Some(id) = state.constructed.pop() {
            let Some(unit) = self.resolver.store().remove(id.as_str()) else {
                continue;
            };
            let Some(instance) = unit.instance else {
                debug!(unit = %id, "Wrapper released");
                continue;
            };
            let dispose = match self.resolver.graph().registry().get(id.as_str()) {
                Some(UnitDefinition::Singleton(singleton)) => singleton.dispose.clone(),
                _ => None,
            };
            let Some(dispose) = dispose else {
                debug!(unit = %id, "Singleton released");
                continue;
            };
            match dispose(instance, unit.context).await {
                Ok(()) => info!(unit = %id, "Singleton disposed"),
                Err(err) => {
                    warn!(unit = %id, error = %ErrorChain(&err), "Disposer failed");
                    failures.push(id, err);
                }
            }
        }

        state.phase = SchedulerPhase::TornDown;
        failures
    }
}
