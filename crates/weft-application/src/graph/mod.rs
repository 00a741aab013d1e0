//! Dependency Graph
//!
//! The validated view of a sealed registry. Building it is the configuration
//! gate of the runtime: every failure here happens before any constructor
//! runs.
//!
//! ## Build pipeline
//!
//! ```text
//! UnitRegistry
//!     │
//!     ├─► config contracts        (InvalidConfig)
//!     ├─► dependency specs        (UnknownUnit, InvalidDependency)
//!     ├─► local wrappers          (InvalidAttachment)
//!     ├─► global attachments      (cached match sets, implicit edges)
//!     ├─► subscriptions           (UnknownUnit)
//!     ├─► cycle detection         (CircularDependency)
//!     └─► construction order
//!           │
//!           ▼
//!     DependencyGraph
//! ```

mod builder;
pub mod cycle;
mod order;

use std::sync::Arc;

use serde_json::Value;
use weft_domain::entities::{Subscription, UnitDefinition};
use weft_domain::value_objects::{
    EdgeKind, EdgeSnapshot, RegistrySnapshot, SubscriptionSnapshot, UnitId, UnitKind, UnitSnapshot,
};

use crate::registry::UnitRegistry;

/// A resolved dependency declaration of one unit
#[derive(Debug, Clone)]
pub struct DeclaredDependency {
    /// Local name
    pub name: String,
    /// Target unit id
    pub target: UnitId,
    /// Target unit kind
    pub target_kind: UnitKind,
}

/// One directed edge, `from` depends on `to`
#[derive(Debug, Clone)]
pub struct Edge {
    /// Registration slot of the dependent unit
    pub from: usize,
    /// Registration slot of the dependency
    pub to: usize,
    /// Origin of the edge
    pub kind: EdgeKind,
    /// Local dependency name, for declared edges
    pub name: Option<String>,
    /// Created from a forward reference
    pub forward: bool,
}

/// Per-unit build results
#[derive(Debug, Clone)]
pub struct UnitNode {
    /// Configuration after the config contract ran
    pub config: Value,
    /// Present dependencies, in declaration order
    pub dependencies: Vec<DeclaredDependency>,
    /// Locally attached wrappers, in declared order
    pub local_wrappers: Vec<UnitId>,
    /// Matching global wrappers, in wrapper registration order
    pub global_wrappers: Vec<UnitId>,
}

/// Validated, acyclic dependency graph over a sealed registry
#[derive(Debug)]
pub struct DependencyGraph {
    registry: Arc<UnitRegistry>,
    nodes: Vec<UnitNode>,
    edges: Vec<Edge>,
    construction_order: Vec<UnitId>,
}

impl DependencyGraph {
    /// The registry this graph was built from
    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    /// Build results for a unit
    pub fn node(&self, id: &str) -> Option<&UnitNode> {
        self.registry.position(id).map(|i| &self.nodes[i])
    }

    /// Validated configuration of a unit
    pub fn config(&self, id: &str) -> Option<&Value> {
        self.node(id).map(|n| &n.config)
    }

    /// Every edge, declared and implicit
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Singleton and wrapper ids in construction order
    pub fn construction_order(&self) -> &[UnitId] {
        &self.construction_order
    }

    /// Full wrapper chain of a unit, outermost first: local then global
    pub fn wrapper_chain(&self, id: &str) -> Vec<UnitId> {
        self.node(id)
            .map(|n| {
                n.local_wrappers
                    .iter()
                    .chain(&n.global_wrappers)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Units a global wrapper was applied to
    pub fn global_matches(&self, wrapper: &str) -> Vec<UnitId> {
        self.registry
            .iter()
            .zip(&self.nodes)
            .filter(|(_, node)| node.global_wrappers.iter().any(|w| w == wrapper))
            .map(|(unit, _)| unit.id().clone())
            .collect()
    }

    /// Diagnostics view of the graph
    pub fn snapshot(&self) -> RegistrySnapshot {
        let units = self
            .registry
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id().clone(),
                kind: unit.kind(),
                tags: unit.header().tags.clone(),
                description: unit.header().description.clone(),
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .filter_map(|edge| {
                Some(EdgeSnapshot {
                    from: self.registry.at(edge.from)?.id().clone(),
                    to: self.registry.at(edge.to)?.id().clone(),
                    kind: edge.kind,
                    name: edge.name.clone(),
                })
            })
            .collect();

        let mut subscriptions = Vec::new();
        for unit in self.registry.iter() {
            if let UnitDefinition::Listener(listener) = unit {
                let notifications = match &listener.subscription {
                    Subscription::Only(ids) => {
                        ids.iter().cloned().map(Some).collect()
                    }
                    Subscription::All => vec![None],
                };
                for notification in notifications {
                    subscriptions.push(SubscriptionSnapshot {
                        notification,
                        listener: unit.id().clone(),
                        priority: listener.priority,
                        active: true,
                    });
                }
            }
        }

        RegistrySnapshot {
            units,
            edges,
            construction_order: self.construction_order.clone(),
            subscriptions,
        }
    }
}
