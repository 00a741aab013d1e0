//! Configuration management
//!
//! Layered configuration for the runtime host:
//!
//! | Layer | Source |
//! |-------|--------|
//! | 1 | [`RuntimeConfig::default`] |
//! | 2 | `weft.toml` (explicit path or discovered) |
//! | 3 | `WEFT_*` environment variables, `__` between nested keys |
//!
//! Unit-level configuration is not read from here; it travels with each
//! unit definition and is validated by the unit's own config contract.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{LoggingConfig, RuntimeConfig, RuntimeSettings};
