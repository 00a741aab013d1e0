//! Domain Port Interfaces
//!
//! | Port | Implemented by |
//! |------|----------------|
//! | [`Contract`] | validation collaborators (closures, [`SchemaContract`]) |
//! | [`Invoker`] | the application runtime core |
//! | [`Publisher`] | the application runtime core |

pub mod contract;
pub mod runtime;

pub use contract::{Contract, SchemaContract};
pub use runtime::{Invoker, Publisher};
