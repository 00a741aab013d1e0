//! Unit definitions
//!
//! Plain data handed to the registry by the authoring surface. Each kind has
//! its own definition struct sharing a [`UnitHeader`]; [`UnitDefinition`] is
//! the sum type the registry stores.
//!
//! ## Example
//!
//! ```
//! use serde_json::{Value, json};
//! use weft_domain::entities::{OperationDefinition, SingletonDefinition, UnitDefinition, UnitRef};
//!
//! struct Db;
//!
//! let db = SingletonDefinition::new("db", |_ctx| async { Ok(Db) });
//! let get_user = OperationDefinition::new("users.get", |input: Value, ctx| async move {
//!     let _db = ctx.deps.instance::<Db>("db")?;
//!     Ok(json!({ "id": input["id"] }))
//! })
//! .depends_on("db", UnitRef::to("db"));
//!
//! let units: Vec<UnitDefinition> = vec![db.into(), get_user.into()];
//! assert_eq!(units.len(), 2);
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use super::attachment::{GlobalAttachment, UnitMeta};
use super::behavior::{
    DisposeFn, InitFn, Instance, ListenFn, Next, RunFn, UnitContext, WrapFn, WrapperContext,
};
use super::dependencies::{DependencyMap, DependencySpec, UnitRef};
use super::notification::{Delivery, Subscription};
use crate::constants::DEFAULT_LISTENER_PRIORITY;
use crate::error::{Error, Result};
use crate::ports::Contract;
use crate::value_objects::{UnitId, UnitKind};

// ============================================================================
// Shared header
// ============================================================================

/// Fields shared by every unit kind
#[derive(Clone)]
pub struct UnitHeader {
    /// Unit id
    pub id: UnitId,
    /// Optional description
    pub description: Option<String>,
    /// Capability tags carried by the unit
    pub tags: Vec<UnitId>,
    /// Raw configuration
    pub config: Value,
    /// Contract applied to `config` during graph build
    pub config_contract: Option<Arc<dyn Contract>>,
    /// Declared dependencies
    pub dependencies: DependencySpec,
}

impl UnitHeader {
    /// Create a header with no dependencies and a null config
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            id: id.into(),
            description: None,
            tags: Vec::new(),
            config: Value::Null,
            config_contract: None,
            dependencies: DependencySpec::default(),
        }
    }
}

impl fmt::Debug for UnitHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitHeader")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .field("config", &self.config)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Header-level builder methods shared by every definition struct
macro_rules! header_builders {
    ($ty:ty) => {
        impl $ty {
            /// Declare a dependency under a local name
            ///
            /// Combines with [`dependencies_from`](Self::dependencies_from) in
            /// either order; neither call discards the other.
            #[must_use]
            pub fn depends_on(mut self, name: impl Into<String>, reference: impl Into<UnitRef>) -> Self {
                let spec = std::mem::take(&mut self.header.dependencies);
                self.header.dependencies = spec.with(name, reference);
                self
            }

            /// Compute dependencies from the unit's configuration
            ///
            /// Computed entries replace earlier declarations of the same name.
            #[must_use]
            pub fn dependencies_from<F>(mut self, f: F) -> Self
            where
                F: Fn(&Value) -> DependencyMap + Send + Sync + 'static,
            {
                let spec = std::mem::take(&mut self.header.dependencies);
                self.header.dependencies = spec.extended(f);
                self
            }

            /// Set the unit's configuration
            #[must_use]
            pub fn with_config(mut self, config: Value) -> Self {
                self.header.config = config;
                self
            }

            /// Validate the configuration with `contract` during graph build
            #[must_use]
            pub fn with_config_contract(mut self, contract: impl Contract + 'static) -> Self {
                self.header.config_contract = Some(Arc::new(contract));
                self
            }

            /// Attach a capability tag
            #[must_use]
            pub fn tagged(mut self, tag: impl Into<UnitId>) -> Self {
                self.header.tags.push(tag.into());
                self
            }

            /// Set a description
            #[must_use]
            pub fn described(mut self, description: impl Into<String>) -> Self {
                self.header.description = Some(description.into());
                self
            }
        }
    };
}

// ============================================================================
// Singleton
// ============================================================================

/// A unit constructed once during start and shared by all dependents
#[derive(Clone)]
pub struct SingletonDefinition {
    /// Shared header
    pub header: UnitHeader,
    /// Constructor
    pub init: InitFn,
    /// Optional disposer, run during teardown
    pub dispose: Option<DisposeFn>,
    /// Locally attached construction wrappers, outermost first
    pub wrappers: Vec<UnitId>,
}

impl SingletonDefinition {
    /// Define a singleton from its constructor
    pub fn new<T, F, Fut>(id: impl Into<UnitId>, init: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(UnitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let init: InitFn = Arc::new(move |ctx| {
            init(ctx)
                .map(|result| result.map(|value| Arc::new(value) as Instance))
                .boxed()
        });
        Self {
            header: UnitHeader::new(id),
            init,
            dispose: None,
            wrappers: Vec::new(),
        }
    }

    /// Run `dispose` on the live instance during teardown
    #[must_use]
    pub fn with_dispose<T, F, Fut>(mut self, dispose: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arc<T>, UnitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let dispose = Arc::new(dispose);
        self.dispose = Some(Arc::new(move |instance: Instance, ctx: UnitContext| {
            let dispose = Arc::clone(&dispose);
            async move {
                let typed = instance.downcast::<T>().map_err(|_| {
                    Error::internal(format!(
                        "instance of '{}' is not a {}",
                        ctx.unit,
                        std::any::type_name::<T>()
                    ))
                })?;
                dispose(typed, ctx).await
            }
            .boxed()
        }));
        self
    }

    /// Attach a construction wrapper (declared order, first is outermost)
    #[must_use]
    pub fn wrapped_by(mut self, wrapper: impl Into<UnitId>) -> Self {
        self.wrappers.push(wrapper.into());
        self
    }
}

header_builders!(SingletonDefinition);

// ============================================================================
// Operation
// ============================================================================

/// A callable unit with input and output
#[derive(Clone)]
pub struct OperationDefinition {
    /// Shared header
    pub header: UnitHeader,
    /// Operation body
    pub run: RunFn,
    /// Contract applied to the input before the wrapper chain runs
    pub input: Option<Arc<dyn Contract>>,
    /// Contract applied to the result before it is returned
    pub output: Option<Arc<dyn Contract>>,
    /// Locally attached wrappers, outermost first
    pub wrappers: Vec<UnitId>,
}

impl OperationDefinition {
    /// Define an operation from its body
    pub fn new<F, Fut>(id: impl Into<UnitId>, run: F) -> Self
    where
        F: Fn(Value, UnitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            header: UnitHeader::new(id),
            run: Arc::new(move |input, ctx| run(input, ctx).boxed()),
            input: None,
            output: None,
            wrappers: Vec::new(),
        }
    }

    /// Validate inputs with `contract`
    #[must_use]
    pub fn with_input(mut self, contract: impl Contract + 'static) -> Self {
        self.input = Some(Arc::new(contract));
        self
    }

    /// Validate results with `contract`
    #[must_use]
    pub fn with_output(mut self, contract: impl Contract + 'static) -> Self {
        self.output = Some(Arc::new(contract));
        self
    }

    /// Attach a wrapper (declared order, first is outermost)
    #[must_use]
    pub fn wrapped_by(mut self, wrapper: impl Into<UnitId>) -> Self {
        self.wrappers.push(wrapper.into());
        self
    }
}

header_builders!(OperationDefinition);

// ============================================================================
// Notification
// ============================================================================

/// A named payload broadcast to listeners
#[derive(Clone)]
pub struct NotificationDefinition {
    /// Shared header
    pub header: UnitHeader,
    /// Contract applied to every published payload
    pub payload: Option<Arc<dyn Contract>>,
}

impl NotificationDefinition {
    /// Define a notification
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            header: UnitHeader::new(id),
            payload: None,
        }
    }

    /// Validate payloads with `contract`
    #[must_use]
    pub fn with_payload(mut self, contract: impl Contract + 'static) -> Self {
        self.payload = Some(Arc::new(contract));
        self
    }
}

header_builders!(NotificationDefinition);

// ============================================================================
// Listener
// ============================================================================

/// A unit subscribed to notifications
#[derive(Clone)]
pub struct ListenerDefinition {
    /// Shared header
    pub header: UnitHeader,
    /// What the listener receives
    pub subscription: Subscription,
    /// Lower runs first; ties run in registration order
    pub priority: i32,
    /// Listener body
    pub run: ListenFn,
}

impl ListenerDefinition {
    /// Define a listener for the given subscription
    pub fn new<F, Fut>(id: impl Into<UnitId>, subscription: Subscription, run: F) -> Self
    where
        F: Fn(Delivery, UnitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            header: UnitHeader::new(id),
            subscription,
            priority: DEFAULT_LISTENER_PRIORITY,
            run: Arc::new(move |delivery, ctx| run(delivery, ctx).boxed()),
        }
    }

    /// Define a listener for a single notification
    pub fn on<F, Fut>(id: impl Into<UnitId>, notification: impl Into<UnitId>, run: F) -> Self
    where
        F: Fn(Delivery, UnitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(id, Subscription::Only(vec![notification.into()]), run)
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

header_builders!(ListenerDefinition);

// ============================================================================
// Wrapper
// ============================================================================

/// Wrapper body, by the kind of unit it wraps
#[derive(Clone)]
pub enum WrapperLogic {
    /// Wraps operation invocations
    Operation(WrapFn<Value>),
    /// Wraps singleton construction
    Singleton(WrapFn<Instance>),
}

/// Cross-cutting logic composed around units
#[derive(Clone)]
pub struct WrapperDefinition {
    /// Shared header
    pub header: UnitHeader,
    /// Wrapper body
    pub logic: WrapperLogic,
    /// Optional global attachment
    pub global: Option<GlobalAttachment>,
}

impl WrapperDefinition {
    /// Define a wrapper for operation invocations
    pub fn for_operations<F, Fut>(id: impl Into<UnitId>, run: F) -> Self
    where
        F: Fn(Value, Next<Value>, WrapperContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            header: UnitHeader::new(id),
            logic: WrapperLogic::Operation(Arc::new(move |input, next, ctx| {
                run(input, next, ctx).boxed()
            })),
            global: None,
        }
    }

    /// Define a wrapper for singleton construction
    ///
    /// The wrapper receives the singleton's config as input and the live
    /// instance as output.
    pub fn for_singletons<F, Fut>(id: impl Into<UnitId>, run: F) -> Self
    where
        F: Fn(Value, Next<Instance>, WrapperContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance>> + Send + 'static,
    {
        Self {
            header: UnitHeader::new(id),
            logic: WrapperLogic::Singleton(Arc::new(move |input, next, ctx| {
                run(input, next, ctx).boxed()
            })),
            global: None,
        }
    }

    /// Apply this wrapper to every unit matched by `attachment`
    #[must_use]
    pub fn applied_globally(mut self, attachment: GlobalAttachment) -> Self {
        self.global = Some(attachment);
        self
    }

    /// Kind of unit this wrapper can wrap
    pub fn target_kind(&self) -> UnitKind {
        match self.logic {
            WrapperLogic::Operation(_) => UnitKind::Operation,
            WrapperLogic::Singleton(_) => UnitKind::Singleton,
        }
    }
}

header_builders!(WrapperDefinition);

// ============================================================================
// Capability tag
// ============================================================================

/// A marker other units can carry
#[derive(Clone)]
pub struct TagDefinition {
    /// Shared header
    pub header: UnitHeader,
}

impl TagDefinition {
    /// Define a capability tag
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            header: UnitHeader::new(id),
        }
    }
}

header_builders!(TagDefinition);

// ============================================================================
// Sum type
// ============================================================================

/// Any unit definition
#[derive(Clone)]
pub enum UnitDefinition {
    /// Singleton
    Singleton(SingletonDefinition),
    /// Operation
    Operation(OperationDefinition),
    /// Notification
    Notification(NotificationDefinition),
    /// Listener
    Listener(ListenerDefinition),
    /// Wrapper
    Wrapper(WrapperDefinition),
    /// Capability tag
    CapabilityTag(TagDefinition),
}

impl UnitDefinition {
    /// Shared header
    pub fn header(&self) -> &UnitHeader {
        match self {
            Self::Singleton(d) => &d.header,
            Self::Operation(d) => &d.header,
            Self::Notification(d) => &d.header,
            Self::Listener(d) => &d.header,
            Self::Wrapper(d) => &d.header,
            Self::CapabilityTag(d) => &d.header,
        }
    }

    /// Mutable shared header
    pub fn header_mut(&mut self) -> &mut UnitHeader {
        match self {
            Self::Singleton(d) => &mut d.header,
            Self::Operation(d) => &mut d.header,
            Self::Notification(d) => &mut d.header,
            Self::Listener(d) => &mut d.header,
            Self::Wrapper(d) => &mut d.header,
            Self::CapabilityTag(d) => &mut d.header,
        }
    }

    /// Unit id
    pub fn id(&self) -> &UnitId {
        &self.header().id
    }

    /// Unit kind
    pub fn kind(&self) -> UnitKind {
        match self {
            Self::Singleton(_) => UnitKind::Singleton,
            Self::Operation(_) => UnitKind::Operation,
            Self::Notification(_) => UnitKind::Notification,
            Self::Listener(_) => UnitKind::Listener,
            Self::Wrapper(_) => UnitKind::Wrapper,
            Self::CapabilityTag(_) => UnitKind::CapabilityTag,
        }
    }

    /// Metadata view for predicates
    pub fn meta(&self) -> UnitMeta<'_> {
        UnitMeta {
            id: self.id(),
            kind: self.kind(),
            tags: &self.header().tags,
        }
    }

    /// Locally attached wrappers (empty for kinds that cannot be wrapped)
    pub fn local_wrappers(&self) -> &[UnitId] {
        match self {
            Self::Singleton(d) => &d.wrappers,
            Self::Operation(d) => &d.wrappers,
            _ => &[],
        }
    }
}

impl fmt::Debug for UnitDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDefinition")
            .field("id", self.id())
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

macro_rules! into_definition {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for UnitDefinition {
            fn from(definition: $ty) -> Self {
                Self::$variant(definition)
            }
        }
    };
}

into_definition!(SingletonDefinition, Singleton);
into_definition!(OperationDefinition, Operation);
into_definition!(NotificationDefinition, Notification);
into_definition!(ListenerDefinition, Listener);
into_definition!(WrapperDefinition, Wrapper);
into_definition!(TagDefinition, CapabilityTag);
