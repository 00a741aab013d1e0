//! Unit tests for notification dispatch

use serde_json::{Value, json};
use weft_application::runtime::CoreOptions;
use weft_domain::entities::{
    ListenerDefinition, NotificationDefinition, OperationDefinition, Subscription, UnitDefinition,
};
use weft_domain::error::{BoxError, Error};
use weft_domain::ports::{Invoker, Publisher};
use weft_domain::value_objects::UnitId;

use crate::test_utils::{Journal, assemble_with, started};

fn recorder(journal: &Journal, id: &'static str, notification: &str) -> ListenerDefinition {
    let log = journal.clone();
    ListenerDefinition::on(id, notification, move |delivery, _ctx| {
        let log = log.clone();
        async move {
            log.record(format!("{id} <- {}", delivery.notification));
            Ok(())
        }
    })
}

/// Listeners run by ascending priority; stopping skips the rest
#[tokio::test]
async fn test_priority_order_and_stop_propagation() {
    let journal = Journal::new();
    let log = journal.clone();
    let stopper = ListenerDefinition::on("second", "order.placed", move |delivery, _ctx| {
        let log = log.clone();
        async move {
            log.record("second <- order.placed");
            delivery.stop();
            Ok(())
        }
    })
    .with_priority(2);
    let units: Vec<UnitDefinition> = vec![
        NotificationDefinition::new("order.placed").into(),
        recorder(&journal, "third", "order.placed").with_priority(3).into(),
        stopper.into(),
        recorder(&journal, "first", "order.placed").with_priority(1).into(),
    ];
    let core = started(units).await;

    core.publish(&UnitId::from("order.placed"), json!({ "id": 1 }))
        .await
        .expect("publish succeeds even when stopped");

    assert_eq!(
        journal.entries(),
        vec!["first <- order.placed", "second <- order.placed"]
    );
}

/// Equal priorities fall back to registration order, wildcards included
#[tokio::test]
async fn test_ties_follow_registration_order() {
    let journal = Journal::new();
    let log = journal.clone();
    let wildcard = ListenerDefinition::new("audit", Subscription::All, move |delivery, _ctx| {
        let log = log.clone();
        async move {
            log.record(format!("audit <- {}", delivery.notification));
            Ok(())
        }
    });
    let units: Vec<UnitDefinition> = vec![
        NotificationDefinition::new("user.created").into(),
        NotificationDefinition::new("user.deleted").into(),
        recorder(&journal, "mailer", "user.created").into(),
        wildcard.into(),
        recorder(&journal, "metrics", "user.created").into(),
        recorder(&journal, "early", "user.created").with_priority(-5).into(),
    ];
    let core = started(units).await;

    assert_eq!(
        core.dispatcher().listeners_for("user.created"),
        [
            UnitId::from("early"),
            UnitId::from("mailer"),
            UnitId::from("audit"),
            UnitId::from("metrics")
        ]
        .as_slice()
    );

    core.publish(&UnitId::from("user.created"), json!(null))
        .await
        .expect("publish");
    core.publish(&UnitId::from("user.deleted"), json!(null))
        .await
        .expect("publish");

    assert_eq!(
        journal.entries(),
        vec![
            "early <- user.created",
            "mailer <- user.created",
            "audit <- user.created",
            "metrics <- user.created",
            "audit <- user.deleted"
        ]
    );
}

/// Publishing with no listeners succeeds
#[tokio::test]
async fn test_publish_without_listeners() {
    let core = started(vec![NotificationDefinition::new("quiet").into()]).await;

    core.publish(&UnitId::from("quiet"), json!(null))
        .await
        .expect("publish");
    assert!(core.dispatcher().listeners_for("quiet").is_empty());
}

/// A listener error stops propagation and reaches the publisher
#[tokio::test]
async fn test_listener_error_propagates() {
    let journal = Journal::new();
    let failing = ListenerDefinition::on("failing", "job.done", |_delivery, _ctx| async {
        Err(Error::execution("listener broke"))
    })
    .with_priority(1);
    let units: Vec<UnitDefinition> = vec![
        NotificationDefinition::new("job.done").into(),
        failing.into(),
        recorder(&journal, "after", "job.done").with_priority(2).into(),
    ];
    let core = started(units).await;

    let err = core
        .publish(&UnitId::from("job.done"), json!(null))
        .await
        .expect_err("listener error");
    assert!(matches!(err, Error::Execution { ref message, .. } if message == "listener broke"));
    assert!(journal.entries().is_empty());
}

/// Payload contracts run before any listener
#[tokio::test]
async fn test_payload_contract_rejects_before_delivery() {
    let journal = Journal::new();
    let notification = NotificationDefinition::new("user.fetched").with_payload(
        |payload: Value| -> Result<Value, BoxError> {
            if payload.get("id").is_some() {
                Ok(payload)
            } else {
                Err("payload needs an id".into())
            }
        },
    );
    let units: Vec<UnitDefinition> = vec![
        notification.into(),
        recorder(&journal, "cache", "user.fetched").into(),
    ];
    let core = started(units).await;

    let err = core
        .publish(&UnitId::from("user.fetched"), json!({}))
        .await
        .expect_err("invalid payload");
    assert!(matches!(err, Error::PayloadValidation { ref notification, .. } if notification == "user.fetched"));
    assert!(journal.entries().is_empty());

    core.publish(&UnitId::from("user.fetched"), json!({ "id": 1 }))
        .await
        .expect("valid payload");
    assert_eq!(journal.entries(), vec!["cache <- user.fetched"]);
}

/// Unknown ids and non-notifications fail with `UnknownNotification`
#[tokio::test]
async fn test_publish_unknown_notification() {
    let core = started(vec![
        OperationDefinition::new("op", |input: Value, _ctx| async move { Ok(input) }).into(),
    ])
    .await;

    for id in ["missing", "op"] {
        let err = core
            .publish(&UnitId::from(id), json!(null))
            .await
            .expect_err("unknown");
        assert!(matches!(err, Error::UnknownNotification { .. }));
    }
}

fn echo_chamber(journal: &Journal) -> Vec<UnitDefinition> {
    let log = journal.clone();
    vec![
        NotificationDefinition::new("ping").into(),
        ListenerDefinition::on("echo", "ping", move |delivery, ctx| {
            let log = log.clone();
            async move {
                log.record(format!("ping {}", delivery.payload));
                let next = delivery.payload.as_u64().unwrap_or_default() + 1;
                ctx.deps.notification("ping")?.publish(json!(next)).await
            }
        })
        .depends_on("ping", "ping")
        .into(),
    ]
}

/// Recursive publishing is bounded by the dispatch depth
#[tokio::test]
async fn test_dispatch_depth_is_bounded() {
    let journal = Journal::new();
    let core = assemble_with(
        echo_chamber(&journal),
        CoreOptions {
            max_dispatch_depth: 3,
        },
    )
    .expect("graph");
    core.start().await.expect("start");

    let err = core
        .publish(&UnitId::from("ping"), json!(0))
        .await
        .expect_err("depth exceeded");
    assert!(matches!(
        err,
        Error::DispatchDepthExceeded { ref notification, depth: 3 } if notification == "ping"
    ));
    assert_eq!(journal.entries(), vec!["ping 0", "ping 1", "ping 2"]);
}

/// Depth is tracked per call chain, so sequential publishes each start at zero
#[tokio::test]
async fn test_dispatch_depth_resets_between_calls() {
    let journal = Journal::new();
    let log = journal.clone();
    let units: Vec<UnitDefinition> = vec![
        NotificationDefinition::new("inner").into(),
        NotificationDefinition::new("outer").into(),
        recorder(&journal, "sink", "inner").into(),
        ListenerDefinition::on("relay", "outer", move |_delivery, ctx| {
            let log = log.clone();
            async move {
                log.record("relay");
                ctx.deps.notification("inner")?.publish(json!(null)).await
            }
        })
        .depends_on("inner", "inner")
        .into(),
    ];
    let core = assemble_with(
        units,
        CoreOptions {
            max_dispatch_depth: 2,
        },
    )
    .expect("graph");
    core.start().await.expect("start");

    for _ in 0..3 {
        core.publish(&UnitId::from("outer"), json!(null))
            .await
            .expect("within depth");
    }
    assert_eq!(journal.count("relay"), 3);
    assert_eq!(journal.count("sink <- inner"), 3);
}

/// Operations publish through injected notification handles
#[tokio::test]
async fn test_operation_publishes_notification() {
    let journal = Journal::new();
    let get_user = OperationDefinition::new("users.get", |input: Value, ctx| async move {
        let user = json!({ "id": input["id"], "name": "Ada" });
        ctx.deps.notification("fetched")?.publish(user.clone()).await?;
        Ok(user)
    })
    .depends_on("fetched", "user.fetched");
    let units: Vec<UnitDefinition> = vec![
        NotificationDefinition::new("user.fetched").into(),
        recorder(&journal, "cache", "user.fetched").into(),
        get_user.into(),
    ];
    let core = started(units).await;

    let user = core
        .invoke(&UnitId::from("users.get"), json!({ "id": 7 }))
        .await
        .expect("invoke");
    assert_eq!(user["name"], json!("Ada"));
    assert_eq!(journal.entries(), vec!["cache <- user.fetched"]);
}
