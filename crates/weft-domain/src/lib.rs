//! # Domain Layer
//!
//! Core types of the weft orchestration runtime: unit definitions, the error
//! taxonomy, value objects and the ports through which unit bodies call back
//! into the runtime. This crate holds no runtime logic.
//!
//! ## Architecture
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`entities`] | Unit definitions, dependencies, behaviours |
//! | [`value_objects`] | Ids, kinds, diagnostic snapshots |
//! | [`ports`] | `Contract`, `Invoker`, `Publisher` |
//! | [`error`] | Error taxonomy |
//! | [`constants`] | Reserved ids and defaults |

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use entities::*;
pub use error::{AggregateDisposeError, BoxError, DisposeFailure, Error, Result};
pub use ports::{Contract, Invoker, Publisher, SchemaContract};
pub use value_objects::*;
