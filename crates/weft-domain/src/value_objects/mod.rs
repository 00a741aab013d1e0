//! Value objects shared by every layer

pub mod discovery;
pub mod ids;
pub mod kind;

pub use discovery::{
    AllowList, DiscoverySnapshot, EdgeKind, EdgeSnapshot, RegistrySnapshot, SubscriptionSnapshot,
    UnitSnapshot,
};
pub use ids::UnitId;
pub use kind::UnitKind;
