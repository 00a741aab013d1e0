//! Infrastructure layer constants
//!
//! Runtime-level constants (reserved notification ids, dispatch defaults)
//! live in `weft_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "weft.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "weft";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "WEFT";

/// Separator between nested keys in environment variable names
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "WEFT_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File stem used when the configured log path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "weft";
