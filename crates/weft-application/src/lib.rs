//! Application Layer - Weft Runtime
//!
//! The resolution and execution runtime: it turns a sealed set of unit
//! definitions into a running system.
//!
//! ## Architecture
//!
//! | Component | Module |
//! |-----------|--------|
//! | Unit Registry | [`registry`] |
//! | Dependency Graph Builder | [`graph`] |
//! | Cycle Detector | [`graph::cycle`] |
//! | Construction/Teardown Scheduler | [`scheduler`] |
//! | Wrapper Composer | [`composer`] |
//! | Operation Execution Engine | [`engine`] |
//! | Notification Dispatcher | [`dispatcher`] |
//! | Scoped State Propagator | [`scope`] |
//!
//! [`runtime::RuntimeCore`] assembles them around one validated graph.
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `weft-domain`: unit definitions, ports and the error taxonomy
//! - async and concurrency libraries (tokio, dashmap, arc-swap)

pub mod composer;
pub mod dispatcher;
pub mod engine;
pub mod graph;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod scheduler;
pub mod scope;
pub mod store;

pub use graph::DependencyGraph;
pub use registry::{RegistryBuilder, UnitRegistry};
pub use runtime::{CoreOptions, RuntimeCore};
pub use scheduler::SchedulerPhase;
pub use scope::{Scope, ScopeFrame};
