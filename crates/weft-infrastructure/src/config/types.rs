//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use weft_domain::constants::DEFAULT_MAX_DISPATCH_DEPTH;

use crate::constants::DEFAULT_LOG_LEVEL;

/// Root configuration of a runtime host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Runtime behaviour
    pub runtime: RuntimeSettings,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json_format: bool,
    /// Also log to a daily-rolling file at this path
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

// ============================================================================
// Runtime Settings
// ============================================================================

/// Runtime behaviour settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Maximum depth of nested publish chains
    pub max_dispatch_depth: usize,
    /// Register and publish `weft.ready` / `weft.stopping`
    pub lifecycle_notifications: bool,
    /// Log unit overrides at info level (debug otherwise)
    pub log_overrides: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            lifecycle_notifications: true,
            log_overrides: true,
        }
    }
}
