//! Unit tests for operation execution

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Notify;
use weft_application::scope::Scope;
use weft_domain::entities::{
    NotificationDefinition, OperationDefinition, SingletonDefinition, UnitDefinition, interceptor,
};
use weft_domain::error::{BoxError, Error};
use weft_domain::ports::Invoker;
use weft_domain::value_objects::UnitId;

use crate::test_utils::{Journal, assemble, started};

fn echo(id: &str) -> OperationDefinition {
    OperationDefinition::new(id, |input: Value, _ctx| async move { Ok(input) })
}

fn requires_id(value: Value) -> Result<Value, BoxError> {
    match value.get("id").and_then(Value::as_str) {
        Some(id) => Ok(json!({ "id": id.trim() })),
        None => Err("missing string field 'id'".into()),
    }
}

/// Unknown ids fail with `UnknownOperation`
#[tokio::test]
async fn test_invoke_unknown_operation() {
    let core = started(vec![echo("known").into()]).await;

    let err = core
        .invoke(&UnitId::from("missing"), json!(null))
        .await
        .expect_err("unknown");
    assert!(matches!(err, Error::UnknownOperation { ref id } if id == "missing"));

    // Only operations are invocable
    let core = started(vec![NotificationDefinition::new("user.created").into()]).await;
    let err = core
        .invoke(&UnitId::from("user.created"), json!(null))
        .await
        .expect_err("not an operation");
    assert!(matches!(err, Error::UnknownOperation { .. }));
}

/// Input contracts reject bad input and normalize good input
#[tokio::test]
async fn test_input_contract_validates_and_transforms() {
    let journal = Journal::new();
    let log = journal.clone();
    let get_user = OperationDefinition::new("users.get", move |input: Value, _ctx| {
        let log = log.clone();
        async move {
            log.record("body");
            Ok(json!({ "user": input["id"] }))
        }
    })
    .with_input(requires_id);
    let core = started(vec![get_user.into()]).await;

    let err = core
        .invoke(&UnitId::from("users.get"), json!({ "name": "ada" }))
        .await
        .expect_err("invalid input");
    assert!(matches!(err, Error::InputValidation { ref operation, .. } if operation == "users.get"));
    assert!(journal.entries().is_empty());

    let output = core
        .invoke(&UnitId::from("users.get"), json!({ "id": "  42 " }))
        .await
        .expect("valid input");
    assert_eq!(output, json!({ "user": "42" }));
}

/// Output contracts run after the body
#[tokio::test]
async fn test_output_contract_rejects_result() {
    let counter = OperationDefinition::new("counter", |input: Value, _ctx| async move { Ok(input) })
        .with_output(|value: Value| -> Result<Value, BoxError> {
            match value.as_i64() {
                Some(n) if n >= 0 => Ok(value),
                _ => Err("expected a non-negative number".into()),
            }
        });
    let core = started(vec![counter.into()]).await;

    assert_eq!(
        core.invoke(&UnitId::from("counter"), json!(3)).await.expect("valid"),
        json!(3)
    );
    let err = core
        .invoke(&UnitId::from("counter"), json!(-1))
        .await
        .expect_err("invalid output");
    assert!(matches!(err, Error::OutputValidation { .. }));
}

/// Body errors reach the caller unchanged
#[tokio::test]
async fn test_body_error_propagates() {
    let failing = OperationDefinition::new("fail", |_input: Value, _ctx| async {
        Err::<Value, _>(Error::execution("boom"))
    });
    let core = started(vec![failing.into()]).await;

    let err = core
        .invoke(&UnitId::from("fail"), json!(null))
        .await
        .expect_err("body fails");
    assert!(matches!(err, Error::Execution { ref message, .. } if message == "boom"));
}

/// A singleton dependency is unresolved before start
#[tokio::test]
async fn test_invoke_before_start_is_unresolved() {
    let core = assemble(vec![
        SingletonDefinition::new("db", |_ctx| async { Ok(()) }).into(),
        echo("users.get").depends_on("db", "db").into(),
    ])
    .expect("graph");

    let err = core
        .invoke(&UnitId::from("users.get"), json!(null))
        .await
        .expect_err("not started");
    assert!(matches!(
        err,
        Error::UnresolvedDependency { ref unit, ref dependency } if unit == "users.get" && dependency == "db"
    ));
}

/// Operations call each other through injected handles
#[tokio::test]
async fn test_operation_calls_dependency_handle() {
    let double = OperationDefinition::new("math.double", |input: Value, _ctx| async move {
        Ok(json!(input.as_i64().unwrap_or_default() * 2))
    });
    let quadruple = OperationDefinition::new("math.quadruple", |input: Value, ctx| async move {
        let double = ctx.deps.operation("double")?;
        let once = double.invoke(input).await?;
        double.invoke(once).await
    })
    .depends_on("double", "math.double");
    let core = started(vec![double.into(), quadruple.into()]).await;

    let output = core
        .invoke(&UnitId::from("math.quadruple"), json!(3))
        .await
        .expect("invoke");
    assert_eq!(output, json!(12));
}

/// The most recently registered interceptor runs outermost
#[tokio::test]
async fn test_interceptors_latest_outermost() {
    let journal = Journal::new();
    let log = journal.clone();
    let op = OperationDefinition::new("greet", move |input: Value, _ctx| {
        let log = log.clone();
        async move {
            log.record("logic");
            Ok(input)
        }
    });
    let core = started(vec![op.into()]).await;
    let id = UnitId::from("greet");

    for name in ["first", "second"] {
        let log = journal.clone();
        core.intercept(
            &id,
            interceptor(move |input, next| {
                let log = log.clone();
                async move {
                    log.record(format!("{name} in"));
                    let output = next.run(input).await;
                    log.record(format!("{name} out"));
                    output
                }
            }),
        )
        .expect("intercept");
    }
    assert_eq!(core.engine().interceptor_count("greet"), 2);

    core.invoke(&id, json!(null)).await.expect("invoke");
    assert_eq!(
        journal.entries(),
        vec!["second in", "first in", "logic", "first out", "second out"]
    );
}

/// Interceptors can replace the result without running the operation
#[tokio::test]
async fn test_interceptor_short_circuits() {
    let core = started(vec![echo("echo").into()]).await;
    let id = UnitId::from("echo");
    core.intercept(&id, interceptor(|_input, _next| async { Ok(json!("intercepted")) }))
        .expect("intercept");

    assert_eq!(
        core.invoke(&id, json!("raw")).await.expect("invoke"),
        json!("intercepted")
    );
}

/// Intercepting an unknown operation fails
#[tokio::test]
async fn test_intercept_unknown_operation() {
    let core = started(vec![echo("echo").into()]).await;

    let err = core
        .intercept(
            &UnitId::from("nope"),
            interceptor(|input, next| async move { next.run(input).await }),
        )
        .expect_err("unknown");
    assert!(matches!(err, Error::UnknownOperation { .. }));
}

/// A call already running keeps the interceptor list it started with
#[tokio::test]
async fn test_in_flight_call_ignores_new_interceptor() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let (entered_body, gate_body) = (Arc::clone(&entered), Arc::clone(&gate));
    let op = OperationDefinition::new("slow", move |input: Value, _ctx| {
        let (entered, gate) = (Arc::clone(&entered_body), Arc::clone(&gate_body));
        async move {
            if input == json!("wait") {
                entered.notify_one();
                gate.notified().await;
            }
            Ok(input)
        }
    });
    let core = started(vec![op.into()]).await;
    let id = UnitId::from("slow");

    let in_flight = tokio::spawn({
        let core = Arc::clone(&core);
        let id = id.clone();
        async move { core.invoke(&id, json!("wait")).await }
    });
    entered.notified().await;

    core.intercept(&id, interceptor(|_input, _next| async { Ok(json!("intercepted")) }))
        .expect("intercept");
    gate.notify_one();

    let first = in_flight.await.expect("join").expect("invoke");
    assert_eq!(first, json!("wait"));
    assert_eq!(
        core.invoke(&id, json!("now")).await.expect("invoke"),
        json!("intercepted")
    );
}

/// The scope-required wrapper rejects calls outside the scope
#[tokio::test]
async fn test_required_scope_wrapper() {
    let tenant: Scope<String> = Scope::new("tenant");
    let reader = tenant.clone();
    let whoami = OperationDefinition::new("whoami", move |_input: Value, _ctx| {
        let reader = reader.clone();
        async move { Ok(json!(reader.current()?)) }
    })
    .wrapped_by("tenant.required");
    let core = started(vec![tenant.required().into(), whoami.into()]).await;
    let id = UnitId::from("whoami");

    let err = core.invoke(&id, json!(null)).await.expect_err("no scope");
    assert!(matches!(err, Error::ScopeNotAvailable { ref scope } if scope == "tenant"));

    let output = tenant
        .provide("acme".to_string(), core.invoke(&id, json!(null)))
        .await
        .expect("scoped");
    assert_eq!(output, json!("acme"));
}

/// Nothing runs once the runtime has been torn down
#[tokio::test]
async fn test_invoke_after_teardown_is_rejected() {
    let core = started(vec![echo("echo").into()]).await;
    let _ = core.teardown().await;

    let id = UnitId::from("echo");
    let err = core.invoke(&id, json!(null)).await.expect_err("stopped");
    assert!(matches!(err, Error::RuntimeStopped));
    let err = core
        .intercept(&id, interceptor(|input, next| async move { next.run(input).await }))
        .expect_err("stopped");
    assert!(matches!(err, Error::RuntimeStopped));
}

/// Handles outliving the runtime report it as stopped
#[tokio::test]
async fn test_handle_outliving_runtime() {
    let leaked = Arc::new(std::sync::Mutex::new(None));
    let slot = Arc::clone(&leaked);
    let units: Vec<UnitDefinition> = vec![
        echo("target").into(),
        OperationDefinition::new("leak", move |_input: Value, ctx| {
            let slot = Arc::clone(&slot);
            async move {
                let handle = ctx.deps.operation("target")?.clone();
                *slot.lock().expect("slot lock") = Some(handle);
                Ok(Value::Null)
            }
        })
        .depends_on("target", "target")
        .into(),
    ];
    let core = started(units).await;
    core.invoke(&UnitId::from("leak"), json!(null))
        .await
        .expect("invoke");
    let _ = core.teardown().await;
    drop(core);

    let handle = leaked.lock().expect("slot lock").take().expect("handle stored");
    let err = handle.invoke(json!(1)).await.expect_err("runtime gone");
    assert!(matches!(err, Error::RuntimeStopped));
}
