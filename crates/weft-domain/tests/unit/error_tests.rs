//! Unit tests for the error taxonomy

use weft_domain::error::{AggregateDisposeError, Error, ErrorChain};
use weft_domain::value_objects::UnitId;

#[test]
fn test_cycle_display_lists_full_path() {
    let err = Error::CircularDependency {
        cycle: vec!["a".into(), "b".into(), "a".into()],
    };

    assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
    assert_eq!(err.cycle().map(<[UnitId]>::len), Some(3));
    assert!(err.is_configuration());
}

#[test]
fn test_construction_error_mentions_teardown_failures() {
    let mut aggregate = AggregateDisposeError::default();
    aggregate.push("cache".into(), Error::execution("flush failed"));

    let err = Error::Construction {
        unit: "db".into(),
        source: Box::new(Error::execution("connection refused")),
        dispose: aggregate.into_option(),
    };

    let message = err.to_string();
    assert!(message.contains("Construction of 'db' failed"));
    assert!(message.contains("connection refused"));
    assert!(message.contains("cache: flush failed"));
    assert!(!err.is_configuration());
}

#[test]
fn test_empty_aggregate_collapses_to_none() {
    assert!(AggregateDisposeError::default().into_option().is_none());
}

#[test]
fn test_aggregate_preserves_order() {
    let mut aggregate = AggregateDisposeError::default();
    aggregate.push("a".into(), Error::execution("first"));
    aggregate.push("b".into(), Error::execution("second"));

    let units: Vec<&str> = aggregate.units().into_iter().map(UnitId::as_str).collect();
    assert_eq!(units, vec!["a", "b"]);
    assert_eq!(
        aggregate.to_string(),
        "2 disposer(s) failed: a: first; b: second"
    );
}

#[test]
fn test_string_conversions_produce_execution_errors() {
    let from_str: Error = "boom".into();
    let from_string: Error = String::from("bang").into();

    assert!(matches!(from_str, Error::Execution { ref message, .. } if message == "boom"));
    assert!(matches!(from_string, Error::Execution { ref message, .. } if message == "bang"));
}

#[test]
fn test_anyhow_conversion_keeps_message() {
    let err: Error = anyhow::anyhow!("upstream unavailable").into();
    assert_eq!(err.to_string(), "upstream unavailable");
}

#[test]
fn test_error_chain_prints_sources() {
    let err = Error::execution_with_source(
        "query failed",
        std::io::Error::other("socket closed"),
    );

    assert_eq!(
        ErrorChain(&err).to_string(),
        "query failed: socket closed"
    );
}

#[test]
fn test_configuration_group_classification() {
    assert!(Error::configuration("bad").is_configuration());
    assert!(Error::unknown_unit("db", "users.get").is_configuration());
    assert!(Error::invalid_attachment("users.get", "not a wrapper").is_configuration());
    assert!(!Error::unresolved("users.get", "db").is_configuration());
    assert!(!Error::scope_not_available("tenant").is_configuration());
    assert!(!Error::RuntimeStopped.is_configuration());
}
