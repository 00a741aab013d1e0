//! Runtime bootstrap
//!
//! [`RuntimeBuilder`] is the host-facing entry point: it collects unit
//! definitions, then either starts them or validates them without running
//! any constructor.
//!
//! ## Startup sequence
//!
//! 1. seal the registry (lifecycle notifications are added here)
//! 2. build the graph: config contracts, dependency and attachment checks,
//!    cycle detection
//! 3. construct singletons and wrappers in dependency order
//! 4. publish `weft.ready`
//!
//! Steps 1 and 2 abort before anything is constructed. A failure in 3 or 4
//! tears down whatever was built before returning the error.
//!
//! ## Example
//!
//! ```
//! use serde_json::{Value, json};
//! use weft_domain::entities::OperationDefinition;
//! use weft_infrastructure::bootstrap::RuntimeBuilder;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> weft_domain::Result<()> {
//! let runtime = RuntimeBuilder::default()
//!     .unit(OperationDefinition::new("echo", |input: Value, _ctx| async move { Ok(input) }))?
//!     .start()
//!     .await?;
//!
//! assert_eq!(runtime.invoke("echo", json!(1)).await?, json!(1));
//! runtime.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{info, warn};
use weft_application::graph::DependencyGraph;
use weft_application::registry::RegistryBuilder;
use weft_application::runtime::{CoreOptions, RuntimeCore};
use weft_domain::constants::{READY_NOTIFICATION, STOPPING_NOTIFICATION};
use weft_domain::entities::{Composition, NotificationDefinition, UnitDefinition};
use weft_domain::error::{Error, ErrorChain, Result};
use weft_domain::ports::Publisher;
use weft_domain::value_objects::{RegistrySnapshot, UnitId};

use crate::config::{RuntimeConfig, RuntimeSettings};
use crate::lifecycle::RuntimeHandle;

/// Collects definitions and starts a runtime
#[derive(Debug)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    registry: RegistryBuilder,
}

impl RuntimeBuilder {
    /// Create a builder for `config`
    pub fn new(config: RuntimeConfig) -> Self {
        let registry = RegistryBuilder::new().log_overrides(config.runtime.log_overrides);
        Self { config, registry }
    }

    /// The configuration this builder starts with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Register the root composition; a second root is `DuplicateRoot`
    pub fn root(mut self, root: Composition) -> Result<Self> {
        self.registry.register_root(root)?;
        Ok(self)
    }

    /// Register loose definitions
    pub fn register<I>(mut self, definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = UnitDefinition>,
    {
        self.registry.register(definitions)?;
        Ok(self)
    }

    /// Register one definition
    pub fn unit(self, definition: impl Into<UnitDefinition>) -> Result<Self> {
        self.register([definition.into()])
    }

    /// Build and check the graph without running any constructor
    pub fn dry_run(self) -> Result<RegistrySnapshot> {
        let graph = self.graph()?.1;
        let snapshot = graph.snapshot();
        info!(
            units = snapshot.units.len(),
            constructed = snapshot.construction_order.len(),
            "Dry run passed"
        );
        Ok(snapshot)
    }

    /// Construct everything and publish `weft.ready`
    pub async fn start(self) -> Result<RuntimeHandle> {
        let (settings, graph) = self.graph()?;
        let core = RuntimeCore::new(
            graph,
            CoreOptions {
                max_dispatch_depth: settings.max_dispatch_depth,
            },
        );
        core.start().await?;

        if settings.lifecycle_notifications {
            let ready = UnitId::from(READY_NOTIFICATION);
            if let Err(err) = core.publish(&ready, serde_json::Value::Null).await {
                warn!(error = %ErrorChain(&err), "Ready listener failed, tearing down");
                let dispose = core.teardown().await;
                return Err(Error::Construction {
                    unit: ready,
                    source: Box::new(err),
                    dispose: dispose.into_option(),
                });
            }
        }

        info!(units = core.graph().registry().len(), "Runtime started");
        Ok(RuntimeHandle::new(core, settings.lifecycle_notifications))
    }

    fn graph(mut self) -> Result<(RuntimeSettings, DependencyGraph)> {
        let settings = self.config.runtime;
        if settings.lifecycle_notifications {
            self.registry.register(lifecycle_notifications())?;
        }
        let graph = DependencyGraph::build(Arc::new(self.registry.seal()))?;
        Ok((settings, graph))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

fn lifecycle_notifications() -> [UnitDefinition; 2] {
    [
        NotificationDefinition::new(READY_NOTIFICATION)
            .described("Published once every singleton is constructed")
            .into(),
        NotificationDefinition::new(STOPPING_NOTIFICATION)
            .described("Published before teardown begins")
            .into(),
    ]
}
