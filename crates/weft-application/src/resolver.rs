//! Dependency resolution
//!
//! Turns the declared dependencies recorded in the graph into live values:
//!
//! | Target kind | Resolved to |
//! |-------------|-------------|
//! | Singleton | the constructed instance, `UnresolvedDependency` if not built yet |
//! | Operation | an [`OperationHandle`] bound to the runtime |
//! | Notification | a [`NotificationHandle`] bound to the runtime |
//! | Capability tag | every unit carrying the tag, in registration order |

use std::sync::{Arc, Weak};

use weft_domain::entities::{
    Dependencies, NotificationHandle, OperationHandle, Resolved, TaggedUnits, UnitContext,
};
use weft_domain::error::{Error, Result};
use weft_domain::ports::{Invoker, Publisher};
use weft_domain::value_objects::{UnitId, UnitKind};

use crate::graph::DependencyGraph;
use crate::store::InstanceStore;

/// Resolves dependencies against the graph and the instance store
pub struct DependencyResolver {
    graph: Arc<DependencyGraph>,
    store: Arc<InstanceStore>,
    invoker: Weak<dyn Invoker>,
    publisher: Weak<dyn Publisher>,
}

impl DependencyResolver {
    /// Create a resolver; handles it creates call back through the weak ports
    pub fn new(
        graph: Arc<DependencyGraph>,
        store: Arc<InstanceStore>,
        invoker: Weak<dyn Invoker>,
        publisher: Weak<dyn Publisher>,
    ) -> Self {
        Self {
            graph,
            store,
            invoker,
            publisher,
        }
    }

    /// Resolve every present dependency of `unit`
    pub fn resolve(&self, unit: &UnitId) -> Result<Dependencies> {
        let node = self
            .graph
            .node(unit.as_str())
            .ok_or_else(|| Error::internal(format!("unit '{unit}' is not in the graph")))?;

        let mut deps = Dependencies::new(unit.clone());
        for dependency in &node.dependencies {
            let value = match dependency.target_kind {
                UnitKind::Singleton => self
                    .store
                    .instance(dependency.target.as_str())
                    .map(Resolved::Instance)
                    .ok_or_else(|| Error::unresolved(unit.clone(), dependency.name.clone()))?,
                UnitKind::Operation => Resolved::Operation(OperationHandle::new(
                    dependency.target.clone(),
                    self.invoker.clone(),
                )),
                UnitKind::Notification => Resolved::Notification(NotificationHandle::new(
                    dependency.target.clone(),
                    self.publisher.clone(),
                )),
                UnitKind::CapabilityTag => Resolved::Tagged(TaggedUnits {
                    tag: dependency.target.clone(),
                    units: self.graph.registry().tagged_with(&dependency.target),
                }),
                kind @ (UnitKind::Listener | UnitKind::Wrapper) => {
                    return Err(Error::internal(format!(
                        "'{unit}' depends on {kind} '{}', which graph build should have rejected",
                        dependency.target
                    )));
                }
            };
            deps.insert(dependency.name.clone(), value);
        }
        Ok(deps)
    }

    /// Build the full context for running `unit`
    pub fn context(&self, unit: &UnitId) -> Result<UnitContext> {
        let deps = self.resolve(unit)?;
        let config = self.graph.config(unit.as_str()).cloned().unwrap_or_default();
        Ok(UnitContext {
            unit: unit.clone(),
            config,
            deps,
        })
    }

    /// Context stored at construction, for singletons and wrappers
    pub fn constructed_context(&self, unit: &UnitId) -> Option<UnitContext> {
        self.store.context(unit.as_str())
    }

    /// The graph being resolved against
    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.graph
    }

    /// The instance store
    pub fn store(&self) -> &Arc<InstanceStore> {
        &self.store
    }
}
