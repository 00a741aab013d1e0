//! Error handling types
//!
//! A single error enum covers every failure the runtime can report. The
//! variants fall into three groups:
//!
//! | Group | Variants | Raised |
//! |-------|----------|--------|
//! | Configuration | `Configuration`, `DuplicateRoot`, `UnknownUnit`, `InvalidAttachment`, `InvalidDependency`, `InvalidConfig`, `CircularDependency` | before any constructor runs |
//! | Lifecycle | `Construction`, `Dispose` | during start / stop |
//! | Per-call | `UnresolvedDependency`, `UnknownOperation`, `UnknownNotification`, `InputValidation`, `OutputValidation`, `PayloadValidation`, `ScopeNotAvailable`, `DependencyType`, `DispatchDepthExceeded`, `Timeout`, `RuntimeStopped`, `Execution` | to the caller of that invocation only |

use std::fmt;

use thiserror::Error;

use crate::value_objects::UnitId;

/// Boxed error used for opaque sources (validation collaborators, user code)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Weft runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Generic configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxError>,
    },

    /// The root composition was registered more than once
    #[error("Root composition registered more than once: {id}")]
    DuplicateRoot {
        /// Id of the root composition
        id: String,
    },

    /// A declared dependency (or subscription) points at an unregistered id
    #[error("Unknown unit '{id}' referenced by '{referenced_by}'")]
    UnknownUnit {
        /// The id that could not be found
        id: UnitId,
        /// The unit that declared the reference
        referenced_by: UnitId,
    },

    /// A wrapper attachment is not valid for its target
    #[error("Invalid wrapper attachment on '{unit}': {message}")]
    InvalidAttachment {
        /// The unit the wrapper was attached to
        unit: UnitId,
        /// Description of the problem
        message: String,
    },

    /// A dependency points at a unit kind that cannot be injected
    #[error("Invalid dependency '{dependency}' on '{unit}': {message}")]
    InvalidDependency {
        /// The unit that declared the dependency
        unit: UnitId,
        /// The dependency target
        dependency: UnitId,
        /// Description of the problem
        message: String,
    },

    /// A unit's configuration was rejected by its config contract
    #[error("Invalid configuration for '{unit}': {source}")]
    InvalidConfig {
        /// The unit whose configuration failed validation
        unit: UnitId,
        /// The underlying validation failure
        #[source]
        source: BoxError,
    },

    /// The dependency graph contains a cycle
    #[error("Circular dependency detected: {}", format_cycle(.cycle))]
    CircularDependency {
        /// The full cycle, closed (first id repeated at the end)
        cycle: Vec<UnitId>,
    },

    /// A singleton constructor failed during start
    #[error("Construction of '{unit}' failed: {source}{}", format_dispose(.dispose))]
    Construction {
        /// The unit whose construction failed
        unit: UnitId,
        /// The primary failure
        #[source]
        source: Box<Error>,
        /// Teardown failures collected while unwinding the partial start
        dispose: Option<AggregateDisposeError>,
    },

    /// One or more disposers failed during teardown
    #[error(transparent)]
    Dispose(#[from] AggregateDisposeError),

    /// A required dependency has no live value yet
    #[error("Unresolved dependency '{dependency}' required by '{unit}'")]
    UnresolvedDependency {
        /// The unit being resolved
        unit: UnitId,
        /// The dependency that has no value
        dependency: String,
    },

    /// No operation is registered under this id
    #[error("Unknown operation: {id}")]
    UnknownOperation {
        /// The requested operation id
        id: UnitId,
    },

    /// No notification is registered under this id
    #[error("Unknown notification: {id}")]
    UnknownNotification {
        /// The requested notification id
        id: UnitId,
    },

    /// An operation input was rejected by its input contract
    #[error("Input validation failed for '{operation}': {source}")]
    InputValidation {
        /// The operation being invoked
        operation: UnitId,
        /// The underlying validation failure
        #[source]
        source: BoxError,
    },

    /// An operation result was rejected by its result contract
    #[error("Output validation failed for '{operation}': {source}")]
    OutputValidation {
        /// The operation being invoked
        operation: UnitId,
        /// The underlying validation failure
        #[source]
        source: BoxError,
    },

    /// A notification payload was rejected by its payload contract
    #[error("Payload validation failed for '{notification}': {source}")]
    PayloadValidation {
        /// The notification being published
        notification: UnitId,
        /// The underlying validation failure
        #[source]
        source: BoxError,
    },

    /// Scoped state was read outside of any providing scope
    #[error("Scope not available: {scope}")]
    ScopeNotAvailable {
        /// Name of the scope
        scope: String,
    },

    /// A resolved dependency does not have the requested shape or type
    #[error("Dependency '{name}' is not a {expected}")]
    DependencyType {
        /// Local dependency name
        name: String,
        /// What the caller asked for
        expected: String,
    },

    /// Nested publish chains exceeded the configured depth
    #[error("Dispatch depth {depth} exceeded while publishing '{notification}'")]
    DispatchDepthExceeded {
        /// The notification that would have exceeded the limit
        notification: UnitId,
        /// The configured maximum depth
        depth: usize,
    },

    /// A timeout wrapper gave up waiting on its inner chain
    #[error("'{unit}' timed out after {elapsed_ms}ms")]
    Timeout {
        /// The wrapped unit
        unit: UnitId,
        /// Elapsed time in milliseconds
        elapsed_ms: u64,
    },

    /// A handle outlived the runtime that issued it
    #[error("Runtime is no longer running")]
    RuntimeStopped,

    /// Error raised by a unit body (operation, listener, wrapper, constructor)
    #[error("{message}")]
    Execution {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxError>,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

/// A single teardown failure
#[derive(Debug)]
pub struct DisposeFailure {
    /// The unit whose disposer failed
    pub unit: UnitId,
    /// The failure itself
    pub error: Error,
}

/// Every teardown failure observed during one teardown pass, in order
#[derive(Error, Debug, Default)]
#[error("{} disposer(s) failed: {}", .failures.len(), format_failures(.failures))]
pub struct AggregateDisposeError {
    /// Individual failures, in the order teardown visited them
    pub failures: Vec<DisposeFailure>,
}

impl AggregateDisposeError {
    /// Record a failure
    pub fn push(&mut self, unit: UnitId, error: Error) {
        self.failures.push(DisposeFailure { unit, error });
    }

    /// Whether no failure was recorded
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Ids of the units whose disposers failed
    pub fn units(&self) -> Vec<&UnitId> {
        self.failures.iter().map(|f| &f.unit).collect()
    }

    /// `None` when nothing failed
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

fn format_cycle(cycle: &[UnitId]) -> String {
    cycle
        .iter()
        .map(UnitId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_dispose(dispose: &Option<AggregateDisposeError>) -> String {
    match dispose {
        Some(aggregate) => format!(" (teardown also failed: {aggregate})"),
        None => String::new(),
    }
}

fn format_failures(failures: &[DisposeFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.unit, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

// Basic error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an execution error, the usual error for unit bodies
    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::Execution {
            message: message.into(),
            source: None,
        }
    }

    /// Create an execution error with source
    pub fn execution_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Execution {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Graph and lookup error creation methods
impl Error {
    /// Create an unknown unit error
    pub fn unknown_unit(id: impl Into<UnitId>, referenced_by: impl Into<UnitId>) -> Self {
        Self::UnknownUnit {
            id: id.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Create an invalid attachment error
    pub fn invalid_attachment<S: Into<String>>(unit: impl Into<UnitId>, message: S) -> Self {
        Self::InvalidAttachment {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved dependency error
    pub fn unresolved(unit: impl Into<UnitId>, dependency: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            unit: unit.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a scope-not-available error
    pub fn scope_not_available<S: Into<String>>(scope: S) -> Self {
        Self::ScopeNotAvailable {
            scope: scope.into(),
        }
    }
}

// Classification helpers
impl Error {
    /// Whether this error belongs to the configuration-time group
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::DuplicateRoot { .. }
                | Self::UnknownUnit { .. }
                | Self::InvalidAttachment { .. }
                | Self::InvalidDependency { .. }
                | Self::InvalidConfig { .. }
                | Self::CircularDependency { .. }
        )
    }

    /// The cycle carried by a `CircularDependency` error
    pub fn cycle(&self) -> Option<&[UnitId]> {
        match self {
            Self::CircularDependency { cycle } => Some(cycle),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Execution {
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::execution_with_source(format!("JSON error: {err}"), err)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::execution(s)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::execution(s)
    }
}

/// Display helper used by diagnostics to print error chains on one line
pub struct ErrorChain<'a>(pub &'a (dyn std::error::Error + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
