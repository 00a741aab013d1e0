//! Stock operation wrappers
//!
//! Resilience behaviour the execution engine deliberately leaves out. Both
//! are ordinary wrapper definitions: register them and attach them locally
//! (`wrapped_by`) or globally (`applied_globally`) like any other wrapper.
//!
//! | Wrapper | Behaviour |
//! |---------|-----------|
//! | [`retry`] | re-runs the inner chain until it succeeds or attempts run out |
//! | [`timeout`] | races the inner chain against a timer, failing with `Timeout` |

pub mod retry;
pub mod timeout;

pub use retry::{RetryPolicy, retry};
pub use timeout::timeout;
