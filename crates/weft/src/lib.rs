//! # Weft
//!
//! An in-process orchestration runtime. Applications declare units
//! (singletons, operations, notifications, listeners, wrappers and
//! capability tags) with their dependencies; weft validates the graph,
//! constructs everything in dependency order, routes operation calls
//! through wrapper chains, delivers notifications by priority and tears
//! everything down in reverse.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::{Value, json};
//! use weft::{
//!     ListenerDefinition, NotificationDefinition, OperationDefinition, RuntimeBuilder,
//!     SingletonDefinition,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> weft::Result<()> {
//! let runtime = RuntimeBuilder::default()
//!     .unit(SingletonDefinition::new("greeting", |_ctx| async { Ok(String::from("hello")) }))?
//!     .unit(NotificationDefinition::new("greeted"))?
//!     .unit(
//!         OperationDefinition::new("greet", |input: Value, ctx| async move {
//!             let greeting: Arc<String> = ctx.deps.instance("greeting")?;
//!             ctx.deps.notification("greeted")?.publish(input.clone()).await?;
//!             Ok(json!(format!("{greeting} {}", input.as_str().unwrap_or("world"))))
//!         })
//!         .depends_on("greeting", "greeting")
//!         .depends_on("greeted", "greeted"),
//!     )?
//!     .unit(ListenerDefinition::on("audit", "greeted", |_delivery, _ctx| async { Ok(()) }))?
//!     .start()
//!     .await?;
//!
//! assert_eq!(runtime.invoke("greet", json!("ada")).await?, json!("hello ada"));
//! runtime.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `domain` - unit definitions, value objects, ports, errors
//! - `application` - registry, graph, scheduler, composer, engine, dispatcher, scopes
//! - `infrastructure` - configuration, logging, lifecycle, stock wrappers

/// Domain layer - unit definitions, ports and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use weft_domain::*;
}

/// Application layer - the resolution and execution runtime
///
/// Re-exports from the application crate for convenience
pub mod application {
    pub use weft_application::*;
}

/// Infrastructure layer - configuration, logging and process lifecycle
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use weft_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export scoped state at the crate root
pub use application::{Scope, ScopeFrame};

// Re-export the host entry points
pub use infrastructure::{
    ConfigLoader, RuntimeBuilder, RuntimeConfig, RuntimeHandle, init_logging, wrappers,
};
