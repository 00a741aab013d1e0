//! Unit kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a registered unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Constructed once during start, shared by all dependents
    Singleton,
    /// Callable unit with input and output
    Operation,
    /// Named payload broadcast to listeners
    Notification,
    /// Subscriber to one or more notifications
    Listener,
    /// Cross-cutting logic composed around operations or singleton construction
    Wrapper,
    /// Marker carried by other units, resolvable as a dependency
    CapabilityTag,
}

impl UnitKind {
    /// Whether units of this kind can be injected as a dependency
    pub fn is_injectable(self) -> bool {
        matches!(
            self,
            Self::Singleton | Self::Operation | Self::Notification | Self::CapabilityTag
        )
    }

    /// Whether units of this kind are nodes of the construction graph
    pub fn is_constructed(self) -> bool {
        matches!(self, Self::Singleton | Self::Wrapper)
    }

    /// Lower-case label used in logs and diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Operation => "operation",
            Self::Notification => "notification",
            Self::Listener => "listener",
            Self::Wrapper => "wrapper",
            Self::CapabilityTag => "capability_tag",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
