//! Tests for error context helpers

use std::io;

use weft_domain::error::Error;
use weft_infrastructure::error_ext::{ErrorContext, to_domain_error};

fn io_failure() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
}

/// `context` produces an execution error keeping the source
#[test]
fn test_context_wraps_as_execution() {
    let err = io_failure().context("Reading users").expect_err("fails");

    assert!(matches!(err, Error::Execution { source: Some(_), .. }));
    assert_eq!(err.to_string(), "Reading users: no such file");
}

/// `with_context` evaluates the message lazily
#[test]
fn test_with_context_is_lazy() {
    let mut evaluated = false;
    let ok: Result<u8, io::Error> = Ok(1);
    let value = ok
        .with_context(|| {
            evaluated = true;
            "never"
        })
        .expect("ok");

    assert_eq!(value, 1);
    assert!(!evaluated);

    let err = io_failure()
        .with_context(|| format!("Loading {}", "weft.toml"))
        .expect_err("fails");
    assert_eq!(err.to_string(), "Loading weft.toml: no such file");
}

/// `config_context` produces a configuration error
#[test]
fn test_config_context_wraps_as_configuration() {
    let err = "eight".parse::<usize>().config_context("Invalid depth").expect_err("fails");

    assert!(err.is_configuration());
    assert!(err.to_string().starts_with("Configuration error: Invalid depth"));
}

/// `to_domain_error` keeps the message prefix
#[test]
fn test_to_domain_error() {
    let err = to_domain_error(io::Error::other("disk full"), "Flushing cache");
    assert_eq!(err.to_string(), "Flushing cache: disk full");
}
