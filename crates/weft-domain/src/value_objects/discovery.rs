//! Read-only views of a registry handed to external collaborators
//!
//! [`DiscoverySnapshot`] is what a transport layer consumes to build its
//! allow-list; [`RegistrySnapshot`] is the richer diagnostics view returned by
//! dry runs and by a running runtime.

use serde::{Deserialize, Serialize};

use super::{UnitId, UnitKind};

/// Allow-list of externally invocable ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    /// Whether the allow-list is enforced
    pub enabled: bool,
    /// Registered operation ids, in registration order
    pub operations: Vec<UnitId>,
    /// Registered notification ids, in registration order
    pub notifications: Vec<UnitId>,
}

/// Discovery response for the transport/exposure layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySnapshot {
    /// The allow-list
    #[serde(rename = "allowList")]
    pub allow_list: AllowList,
}

/// How an edge entered the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Declared in the unit's dependency map
    Declared,
    /// Unit lists the wrapper in its local wrapper attachments
    LocalWrapper,
    /// Wrapper's global attachment predicate matched the unit
    GlobalWrapper,
}

/// One edge of the dependency graph, `from` depends on `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    /// Dependent unit
    pub from: UnitId,
    /// Dependency
    pub to: UnitId,
    /// Origin of the edge
    pub kind: EdgeKind,
    /// Local name for declared edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Summary of one registered unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id
    pub id: UnitId,
    /// Unit kind
    pub kind: UnitKind,
    /// Capability tags carried by the unit
    pub tags: Vec<UnitId>,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One listener subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    /// Notification id, or `None` for the wildcard subscription
    pub notification: Option<UnitId>,
    /// Listener id
    pub listener: UnitId,
    /// Listener priority (lower runs first)
    pub priority: i32,
    /// Always true, subscriptions live as long as the registration
    pub active: bool,
}

/// Diagnostics view of a validated registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Every unit, in registration order
    pub units: Vec<UnitSnapshot>,
    /// Every edge (declared and implicit)
    pub edges: Vec<EdgeSnapshot>,
    /// Singleton and wrapper ids in construction order
    pub construction_order: Vec<UnitId>,
    /// Notification subscriptions
    pub subscriptions: Vec<SubscriptionSnapshot>,
}

impl RegistrySnapshot {
    /// Ids of every unit of the given kind, in registration order
    pub fn ids_of(&self, kind: UnitKind) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.kind == kind)
            .map(|u| u.id.clone())
            .collect()
    }

    /// The discovery view derived from this snapshot
    pub fn discovery(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            allow_list: AllowList {
                enabled: true,
                operations: self.ids_of(UnitKind::Operation),
                notifications: self.ids_of(UnitKind::Notification),
            },
        }
    }
}
