//! Domain entities
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`definition`] | per-kind unit definitions and the [`UnitDefinition`] sum type |
//! | [`composition`] | the root [`Composition`] tree |
//! | [`dependencies`] | declared references and resolved dependency values |
//! | [`behavior`] | boxed behaviour closures, contexts and [`Next`] |
//! | [`notification`] | subscriptions and delivery control |
//! | [`attachment`] | global wrapper predicates |

pub mod attachment;
pub mod behavior;
pub mod composition;
pub mod definition;
pub mod dependencies;
pub mod notification;

pub use attachment::{GlobalAttachment, UnitMeta};
pub use behavior::{
    DisposeFn, InitFn, Instance, Interceptor, ListenFn, Next, RunFn, UnitContext, WrapFn,
    WrapperContext, interceptor,
};
pub use composition::Composition;
pub use definition::{
    ListenerDefinition, NotificationDefinition, OperationDefinition, SingletonDefinition,
    TagDefinition, UnitDefinition, UnitHeader, WrapperDefinition, WrapperLogic,
};
pub use dependencies::{
    Dependencies, DependencyMap, DependencySpec, NotificationHandle, OperationHandle, RefTarget,
    Resolved, TaggedUnits, UnitRef,
};
pub use notification::{Delivery, Propagation, Subscription};
