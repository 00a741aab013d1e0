//! Declared and resolved dependencies
//!
//! A unit declares its dependencies as a [`DependencySpec`]: either a fixed
//! [`DependencyMap`] or a function of the unit's own configuration. The
//! runtime turns the declaration into graph edges once, during graph build,
//! and later hands the unit a [`Dependencies`] map of live values.
//!
//! ```text
//! DependencySpec ──(graph build, once)──► edges ──(resolve, per use)──► Dependencies
//!   "db"     → UnitRef::to("db")                                          "db" → Instance
//!   "audit"  → UnitRef::to("audit").optional()                            (absent: skipped)
//!   "peer"   → UnitRef::forward(|| "users.get")                           "peer" → OperationHandle
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use super::behavior::{Instance, Interceptor};
use crate::error::{Error, Result};
use crate::ports::{Invoker, Publisher};
use crate::value_objects::UnitId;

// ============================================================================
// Declarations
// ============================================================================

/// Target of a reference
#[derive(Clone)]
pub enum RefTarget {
    /// Reference by id, known at definition time
    Id(UnitId),
    /// Forward reference, evaluated during graph build
    Forward(Arc<dyn Fn() -> UnitId + Send + Sync>),
}

/// A reference to another unit
#[derive(Clone)]
pub struct UnitRef {
    target: RefTarget,
    optional: bool,
}

impl UnitRef {
    /// Reference a unit by id
    pub fn to(id: impl Into<UnitId>) -> Self {
        Self {
            target: RefTarget::Id(id.into()),
            optional: false,
        }
    }

    /// Reference a unit whose id is only known once every module has loaded
    pub fn forward<F>(f: F) -> Self
    where
        F: Fn() -> UnitId + Send + Sync + 'static,
    {
        Self {
            target: RefTarget::Forward(Arc::new(f)),
            optional: false,
        }
    }

    /// Resolve to nothing instead of failing when the target is absent
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether the reference is optional
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the reference is a forward reference
    pub fn is_forward(&self) -> bool {
        matches!(self.target, RefTarget::Forward(_))
    }

    /// Evaluate the target id
    pub fn resolve_id(&self) -> UnitId {
        match &self.target {
            RefTarget::Id(id) => id.clone(),
            RefTarget::Forward(f) => f(),
        }
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            RefTarget::Id(id) => id.to_string(),
            RefTarget::Forward(_) => "<forward>".to_string(),
        };
        f.debug_struct("UnitRef")
            .field("target", &target)
            .field("optional", &self.optional)
            .finish()
    }
}

impl From<&str> for UnitRef {
    fn from(id: &str) -> Self {
        Self::to(id)
    }
}

impl From<UnitId> for UnitRef {
    fn from(id: UnitId) -> Self {
        Self::to(id)
    }
}

/// Ordered map of local name to reference
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    entries: Vec<(String, UnitRef)>,
}

impl DependencyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a dependency under `name`
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, reference: impl Into<UnitRef>) -> Self {
        self.insert(name, reference);
        self
    }

    /// Add (or replace) a dependency under `name`
    pub fn insert(&mut self, name: impl Into<String>, reference: impl Into<UnitRef>) {
        let name = name.into();
        let reference = reference.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = reference,
            None => self.entries.push((name, reference)),
        }
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitRef)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a unit declares its dependencies
#[derive(Clone)]
pub enum DependencySpec {
    /// Fixed map
    Static(DependencyMap),
    /// Computed once from the unit's validated configuration
    Dynamic(Arc<dyn Fn(&Value) -> DependencyMap + Send + Sync>),
}

impl DependencySpec {
    /// Evaluate the declaration against the unit's configuration
    pub fn evaluate(&self, config: &Value) -> DependencyMap {
        match self {
            Self::Static(map) => map.clone(),
            Self::Dynamic(f) => f(config),
        }
    }

    /// Add a fixed entry
    ///
    /// A dynamic declaration keeps its function; the entry is layered over
    /// whatever the function returns.
    #[must_use]
    pub fn with(self, name: impl Into<String>, reference: impl Into<UnitRef>) -> Self {
        let name = name.into();
        let reference = reference.into();
        match self {
            Self::Static(map) => Self::Static(map.with(name, reference)),
            Self::Dynamic(f) => Self::Dynamic(Arc::new(move |config: &Value| {
                f(config).with(name.clone(), reference.clone())
            })),
        }
    }

    /// Layer a map computed from the configuration over this declaration
    ///
    /// Entries from `f` replace earlier entries of the same name.
    #[must_use]
    pub fn extended<F>(self, f: F) -> Self
    where
        F: Fn(&Value) -> DependencyMap + Send + Sync + 'static,
    {
        if matches!(&self, Self::Static(map) if map.is_empty()) {
            return Self::Dynamic(Arc::new(f));
        }
        Self::Dynamic(Arc::new(move |config: &Value| {
            let mut map = self.evaluate(config);
            for (name, reference) in f(config).iter() {
                map.insert(name, reference.clone());
            }
            map
        }))
    }
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self::Static(DependencyMap::new())
    }
}

impl fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Callable handle to an operation
#[derive(Clone)]
pub struct OperationHandle {
    id: UnitId,
    invoker: Weak<dyn Invoker>,
}

impl OperationHandle {
    /// Create a handle bound to an invoker
    pub fn new(id: UnitId, invoker: Weak<dyn Invoker>) -> Self {
        Self { id, invoker }
    }

    /// The operation id
    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Invoke the operation
    pub async fn invoke(&self, input: Value) -> Result<Value> {
        let invoker = self.invoker.upgrade().ok_or(Error::RuntimeStopped)?;
        invoker.invoke(&self.id, input).await
    }

    /// Intercept every subsequent invocation of the operation
    pub fn intercept(&self, interceptor: Interceptor) -> Result<()> {
        let invoker = self.invoker.upgrade().ok_or(Error::RuntimeStopped)?;
        invoker.intercept(&self.id, interceptor)
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OperationHandle").field(&self.id).finish()
    }
}

/// Handle used to publish a notification
#[derive(Clone)]
pub struct NotificationHandle {
    id: UnitId,
    publisher: Weak<dyn Publisher>,
}

impl NotificationHandle {
    /// Create a handle bound to a publisher
    pub fn new(id: UnitId, publisher: Weak<dyn Publisher>) -> Self {
        Self { id, publisher }
    }

    /// The notification id
    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Publish the notification and wait for its listeners
    pub async fn publish(&self, payload: Value) -> Result<()> {
        let publisher = self.publisher.upgrade().ok_or(Error::RuntimeStopped)?;
        publisher.publish(&self.id, payload).await
    }
}

impl fmt::Debug for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NotificationHandle").field(&self.id).finish()
    }
}

/// Every unit carrying a capability tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedUnits {
    /// The tag
    pub tag: UnitId,
    /// Units carrying the tag, in registration order
    pub units: Vec<UnitId>,
}

// ============================================================================
// Resolved values
// ============================================================================

/// A resolved dependency value
#[derive(Clone)]
pub enum Resolved {
    /// A constructed singleton
    Instance(Instance),
    /// An operation
    Operation(OperationHandle),
    /// A notification
    Notification(NotificationHandle),
    /// A capability tag
    Tagged(TaggedUnits),
}

impl Resolved {
    fn shape(&self) -> &'static str {
        match self {
            Self::Instance(_) => "singleton instance",
            Self::Operation(_) => "operation",
            Self::Notification(_) => "notification",
            Self::Tagged(_) => "capability tag",
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Operation(h) => h.fmt(f),
            Self::Notification(h) => h.fmt(f),
            Self::Tagged(t) => t.fmt(f),
        }
    }
}

/// Resolved dependencies of one unit, keyed by local name
///
/// Optional dependencies whose target is absent have no entry.
#[derive(Clone)]
pub struct Dependencies {
    owner: UnitId,
    entries: HashMap<String, Resolved>,
}

impl Dependencies {
    /// Create an empty set for `owner`
    pub fn new(owner: impl Into<UnitId>) -> Self {
        Self {
            owner: owner.into(),
            entries: HashMap::new(),
        }
    }

    /// Add a resolved value
    pub fn insert(&mut self, name: impl Into<String>, value: Resolved) {
        self.entries.insert(name.into(), value);
    }

    /// The unit these dependencies belong to
    pub fn owner(&self) -> &UnitId {
        &self.owner
    }

    /// Whether a value is present under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Local names with a value, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Raw access to a resolved value
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.entries.get(name)
    }

    /// Typed access to a singleton instance
    pub fn instance<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        match self.require(name)? {
            Resolved::Instance(instance) => {
                Arc::clone(instance)
                    .downcast::<T>()
                    .map_err(|_| Error::DependencyType {
                        name: name.to_string(),
                        expected: type_name::<T>().to_string(),
                    })
            }
            other => Err(Self::wrong_shape(name, other, type_name::<T>())),
        }
    }

    /// Typed access to an optional singleton instance
    ///
    /// Returns `Ok(None)` when the dependency is absent, and an error only when
    /// it is present with a different type.
    pub fn optional_instance<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        if self.contains(name) {
            self.instance(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Handle to an injected operation
    pub fn operation(&self, name: &str) -> Result<&OperationHandle> {
        match self.require(name)? {
            Resolved::Operation(handle) => Ok(handle),
            other => Err(Self::wrong_shape(name, other, "operation")),
        }
    }

    /// Handle to an injected notification
    pub fn notification(&self, name: &str) -> Result<&NotificationHandle> {
        match self.require(name)? {
            Resolved::Notification(handle) => Ok(handle),
            other => Err(Self::wrong_shape(name, other, "notification")),
        }
    }

    /// Units carrying an injected capability tag
    pub fn tagged(&self, name: &str) -> Result<&TaggedUnits> {
        match self.require(name)? {
            Resolved::Tagged(tagged) => Ok(tagged),
            other => Err(Self::wrong_shape(name, other, "capability tag")),
        }
    }

    fn require(&self, name: &str) -> Result<&Resolved> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::unresolved(self.owner.clone(), name))
    }

    fn wrong_shape(name: &str, found: &Resolved, expected: &str) -> Error {
        Error::DependencyType {
            name: name.to_string(),
            expected: format!("{expected} (found {})", found.shape()),
        }
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("owner", &self.owner)
            .field("entries", &self.entries)
            .finish()
    }
}
