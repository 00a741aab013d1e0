//! Unit tests for wrapper composition

use serde_json::{Value, json};
use weft_domain::entities::{
    GlobalAttachment, OperationDefinition, SingletonDefinition, UnitDefinition, WrapperDefinition,
};
use weft_domain::error::Error;
use weft_domain::ports::Invoker;
use weft_domain::value_objects::UnitId;

use crate::test_utils::{Journal, started};

fn recording(journal: &Journal, id: &'static str) -> WrapperDefinition {
    let log = journal.clone();
    WrapperDefinition::for_operations(id, move |input, next, _ctx| {
        let log = log.clone();
        async move {
            log.record(format!("{id} in"));
            let output = next.run(input).await;
            log.record(format!("{id} out"));
            output
        }
    })
}

fn logic(journal: &Journal, id: &str) -> OperationDefinition {
    let log = journal.clone();
    OperationDefinition::new(id, move |input: Value, _ctx| {
        let log = log.clone();
        async move {
            log.record("logic");
            Ok(input)
        }
    })
}

/// Local wrappers run in declared order, then global ones, then the logic
#[tokio::test]
async fn test_chain_runs_local_then_global_wrappers() {
    let journal = Journal::new();
    let units: Vec<UnitDefinition> = vec![
        recording(&journal, "l1").into(),
        recording(&journal, "l2").into(),
        recording(&journal, "g")
            .applied_globally(GlobalAttachment::everywhere())
            .into(),
        logic(&journal, "greet").wrapped_by("l1").wrapped_by("l2").into(),
    ];
    let core = started(units).await;

    let output = core
        .invoke(&UnitId::from("greet"), json!({ "name": "ada" }))
        .await
        .expect("invoke");

    assert_eq!(output, json!({ "name": "ada" }));
    assert_eq!(
        journal.entries(),
        vec!["l1 in", "l2 in", "g in", "logic", "g out", "l2 out", "l1 out"]
    );
    let _ = core.teardown().await;
}

/// A wrapper that never calls `next` short-circuits the chain
#[tokio::test]
async fn test_wrapper_can_short_circuit() {
    let journal = Journal::new();
    let cached = WrapperDefinition::for_operations("cached", |_input, _next, _ctx| async {
        Ok(json!("from cache"))
    });
    let units: Vec<UnitDefinition> = vec![
        cached.into(),
        recording(&journal, "inner").into(),
        logic(&journal, "lookup")
            .wrapped_by("cached")
            .wrapped_by("inner")
            .into(),
    ];
    let core = started(units).await;

    let output = core
        .invoke(&UnitId::from("lookup"), json!(1))
        .await
        .expect("invoke");

    assert_eq!(output, json!("from cache"));
    assert!(journal.entries().is_empty());
    let _ = core.teardown().await;
}

/// A failing wrapper skips the rest of the chain and its error unwinds
/// through the wrappers already entered
#[tokio::test]
async fn test_failing_wrapper_unwinds_through_outer_wrappers() {
    let journal = Journal::new();
    let gate = WrapperDefinition::for_operations("gate", |_input, _next, _ctx| async {
        Err(Error::execution("quota exhausted"))
    });
    let units: Vec<UnitDefinition> = vec![
        recording(&journal, "outer").into(),
        gate.into(),
        recording(&journal, "inner").into(),
        logic(&journal, "export")
            .wrapped_by("outer")
            .wrapped_by("gate")
            .wrapped_by("inner")
            .into(),
    ];
    let core = started(units).await;

    let err = core
        .invoke(&UnitId::from("export"), json!({}))
        .await
        .expect_err("gate rejects");

    assert!(matches!(&err, Error::Execution { message, source: None } if message == "quota exhausted"));
    assert_eq!(journal.entries(), vec!["outer in", "outer out"]);
    let _ = core.teardown().await;
}

/// Calling `next` twice re-runs the inner chain each time
#[tokio::test]
async fn test_wrapper_can_call_next_repeatedly() {
    let journal = Journal::new();
    let twice = WrapperDefinition::for_operations("twice", |input, next, _ctx| async move {
        let first = next.run(input).await?;
        let second = next.run(first.clone()).await?;
        Ok(json!([first, second]))
    });
    let units: Vec<UnitDefinition> = vec![
        twice.into(),
        recording(&journal, "inner").into(),
        logic(&journal, "echo")
            .wrapped_by("twice")
            .wrapped_by("inner")
            .into(),
    ];
    let core = started(units).await;

    let output = core
        .invoke(&UnitId::from("echo"), json!("x"))
        .await
        .expect("invoke");

    assert_eq!(output, json!(["x", "x"]));
    assert_eq!(journal.count("logic"), 2);
    assert_eq!(journal.count("inner in"), 2);
    let _ = core.teardown().await;
}

/// Wrappers may rewrite input and output
#[tokio::test]
async fn test_wrapper_transforms_input_and_output() {
    let doubling = WrapperDefinition::for_operations("doubling", |input: Value, next, _ctx| async move {
        let n = input.as_i64().unwrap_or_default();
        let output = next.run(json!(n * 2)).await?;
        Ok(json!({ "result": output }))
    });
    let add_one = OperationDefinition::new("add_one", |input: Value, _ctx| async move {
        Ok(json!(input.as_i64().unwrap_or_default() + 1))
    })
    .wrapped_by("doubling");
    let core = started(vec![doubling.into(), add_one.into()]).await;

    let output = core
        .invoke(&UnitId::from("add_one"), json!(5))
        .await
        .expect("invoke");

    assert_eq!(output, json!({ "result": 11 }));
    let _ = core.teardown().await;
}

/// A wrapper sees its own config, deps and the id of the wrapped unit
#[tokio::test]
async fn test_wrapper_context_carries_config_and_target() {
    let journal = Journal::new();
    let log = journal.clone();
    let tagged = WrapperDefinition::for_operations("tagged", move |input, next, ctx| {
        let log = log.clone();
        async move {
            let prefix = ctx.deps.instance::<String>("prefix")?;
            log.record(format!(
                "{prefix} {} via {} level={}",
                ctx.target, ctx.wrapper, ctx.config["level"]
            ));
            next.run(input).await
        }
    })
    .with_config(json!({ "level": 3 }))
    .depends_on("prefix", "prefix");
    let units: Vec<UnitDefinition> = vec![
        SingletonDefinition::new("prefix", |_ctx| async { Ok(String::from("[audit]")) }).into(),
        tagged.into(),
        logic(&journal, "users.get").wrapped_by("tagged").into(),
    ];
    let core = started(units).await;

    core.invoke(&UnitId::from("users.get"), json!(null))
        .await
        .expect("invoke");

    assert_eq!(
        journal.entries(),
        vec!["[audit] users.get via tagged level=3", "logic"]
    );
    let _ = core.teardown().await;
}

/// Global wrappers only reach units their predicate matches
#[tokio::test]
async fn test_global_wrapper_respects_predicate() {
    let journal = Journal::new();
    let units: Vec<UnitDefinition> = vec![
        recording(&journal, "billing.audit")
            .applied_globally(GlobalAttachment::id_prefix("billing."))
            .into(),
        logic(&journal, "billing.charge").into(),
        logic(&journal, "users.get").into(),
    ];
    let core = started(units).await;

    core.invoke(&UnitId::from("users.get"), json!(null))
        .await
        .expect("users.get");
    assert_eq!(journal.entries(), vec!["logic"]);

    core.invoke(&UnitId::from("billing.charge"), json!(null))
        .await
        .expect("billing.charge");
    assert_eq!(
        journal.entries(),
        vec!["logic", "billing.audit in", "logic", "billing.audit out"]
    );
    let _ = core.teardown().await;
}
