//! Validation Collaborator Port
//!
//! Input, output, payload and configuration contracts are opaque to the
//! runtime: it only ever calls [`Contract::parse`]. Any schema library can be
//! plugged in by implementing this one method.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use weft_domain::ports::{Contract, SchemaContract};
//!
//! #[derive(Serialize, Deserialize)]
//! struct GetUser {
//!     id: String,
//! }
//!
//! let contract: Arc<dyn Contract> = Arc::new(SchemaContract::<GetUser>::new());
//! assert!(contract.parse(serde_json::json!({ "id": "42" })).is_ok());
//! assert!(contract.parse(serde_json::json!({ "name": "x" })).is_err());
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BoxError;

/// A validation/transformation contract
pub trait Contract: Send + Sync {
    /// Validate `value`, returning the (possibly transformed) value
    fn parse(&self, value: Value) -> std::result::Result<Value, BoxError>;
}

impl<F> Contract for F
where
    F: Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync,
{
    fn parse(&self, value: Value) -> std::result::Result<Value, BoxError> {
        self(value)
    }
}

/// Contract that validates by deserializing into `T` and re-serializing
///
/// Unknown fields are dropped and serde defaults are filled in, so the value
/// handed on is the normalized form of `T`.
pub struct SchemaContract<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SchemaContract<T> {
    /// Create a new schema contract
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SchemaContract<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SchemaContract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaContract")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Contract for SchemaContract<T>
where
    T: DeserializeOwned + Serialize,
{
    fn parse(&self, value: Value) -> std::result::Result<Value, BoxError> {
        let typed: T = serde_json::from_value(value)?;
        Ok(serde_json::to_value(typed)?)
    }
}
