//! Infrastructure Layer
//!
//! Everything a host process needs around the runtime core.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bootstrap`] | `RuntimeBuilder`: register, dry-run, start |
//! | [`lifecycle`] | `RuntimeHandle`, shutdown coordination |
//! | [`config`] | Layered configuration with figment |
//! | [`logging`] | `tracing-subscriber` setup |
//! | [`wrappers`] | Stock retry and timeout wrappers |
//! | [`error_ext`] | Error context helpers |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod lifecycle;
pub mod logging;
pub mod wrappers;

pub use bootstrap::RuntimeBuilder;
pub use config::{ConfigLoader, LoggingConfig, RuntimeConfig, RuntimeSettings};
pub use error_ext::ErrorContext;
pub use lifecycle::{RuntimeHandle, ShutdownCoordinator};
pub use logging::init_logging;
