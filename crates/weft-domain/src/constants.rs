//! Domain constants

// ============================================================================
// Lifecycle notifications
// ============================================================================

/// Published once every singleton has been constructed
pub const READY_NOTIFICATION: &str = "weft.ready";

/// Published before teardown begins
pub const STOPPING_NOTIFICATION: &str = "weft.stopping";

/// Prefix reserved for runtime-owned units
pub const RESERVED_PREFIX: &str = "weft.";

// ============================================================================
// Dispatch
// ============================================================================

/// Priority given to listeners that do not set one
pub const DEFAULT_LISTENER_PRIORITY: i32 = 0;

/// Default limit for nested publish chains
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;
