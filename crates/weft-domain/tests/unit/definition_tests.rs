//! Unit tests for unit definitions

use serde_json::{Value, json};
use weft_domain::entities::{
    DependencyMap, DependencySpec, GlobalAttachment, ListenerDefinition, NotificationDefinition,
    OperationDefinition, SingletonDefinition, Subscription, TagDefinition, UnitDefinition,
    UnitRef, WrapperDefinition,
};
use weft_domain::value_objects::UnitKind;

#[test]
fn test_definition_kinds() {
    let units: Vec<UnitDefinition> = vec![
        SingletonDefinition::new("db", |_ctx| async { Ok(()) }).into(),
        OperationDefinition::new("users.get", |input, _ctx| async move { Ok(input) }).into(),
        NotificationDefinition::new("users.fetched").into(),
        ListenerDefinition::on("audit", "users.fetched", |_d, _ctx| async { Ok(()) }).into(),
        WrapperDefinition::for_operations("logged", |input, next, _ctx| async move {
            next.run(input).await
        })
        .into(),
        TagDefinition::new("http.handler").into(),
    ];

    let kinds: Vec<UnitKind> = units.iter().map(UnitDefinition::kind).collect();
    assert_eq!(
        kinds,
        vec![
            UnitKind::Singleton,
            UnitKind::Operation,
            UnitKind::Notification,
            UnitKind::Listener,
            UnitKind::Wrapper,
            UnitKind::CapabilityTag,
        ]
    );
}

#[test]
fn test_header_builders() {
    let op = OperationDefinition::new("users.get", |_input, _ctx| async { Ok(Value::Null) })
        .depends_on("db", "db")
        .depends_on("audit", UnitRef::to("audit").optional())
        .with_config(json!({ "limit": 10 }))
        .tagged("http.handler")
        .described("Fetch a user")
        .wrapped_by("logged")
        .wrapped_by("timed");

    let def: UnitDefinition = op.into();
    let header = def.header();
    assert_eq!(header.config["limit"], 10);
    assert_eq!(header.description.as_deref(), Some("Fetch a user"));
    assert!(def.meta().has_tag("http.handler"));
    assert_eq!(def.local_wrappers().len(), 2);
    match &header.dependencies {
        DependencySpec::Static(map) => assert_eq!(map.len(), 2),
        DependencySpec::Dynamic(_) => panic!("expected static dependencies"),
    }
}

#[test]
fn test_listener_defaults_and_subscription() {
    let listener = ListenerDefinition::new("metrics", Subscription::All, |_d, _ctx| async {
        Ok(())
    })
    .with_priority(-5);

    assert_eq!(listener.priority, -5);
    assert!(listener.subscription.covers(&"anything".into()));
}

#[test]
fn test_wrapper_target_kind_and_global() {
    let wrapper = WrapperDefinition::for_singletons("traced", |input, next, _ctx| async move {
        next.run(input).await
    })
    .applied_globally(GlobalAttachment::id_prefix("billing."));

    assert_eq!(wrapper.target_kind(), UnitKind::Singleton);
    assert_eq!(
        wrapper.global.as_ref().map(GlobalAttachment::label),
        Some("id_prefix(billing.)")
    );
}

fn declared(definition: &OperationDefinition, config: &Value) -> Vec<(String, String)> {
    definition
        .header
        .dependencies
        .evaluate(config)
        .iter()
        .map(|(name, reference)| (name.to_string(), reference.resolve_id().to_string()))
        .collect()
}

#[test]
fn test_depends_on_keeps_dynamic_dependencies() {
    let definition = OperationDefinition::new("users.get", |input, _ctx| async move { Ok(input) })
        .dependencies_from(|config: &Value| {
            DependencyMap::new().with("store", config["backend"].as_str().unwrap_or("memory"))
        })
        .depends_on("audit", "audit.log");

    assert_eq!(
        declared(&definition, &json!({ "backend": "postgres" })),
        vec![
            ("store".to_string(), "postgres".to_string()),
            ("audit".to_string(), "audit.log".to_string()),
        ]
    );
}

#[test]
fn test_dynamic_dependencies_layer_over_static_ones() {
    let definition = OperationDefinition::new("users.get", |input, _ctx| async move { Ok(input) })
        .depends_on("audit", "audit.log")
        .depends_on("store", "memory")
        .dependencies_from(|config: &Value| match config["backend"].as_str() {
            Some(backend) => DependencyMap::new().with("store", backend),
            None => DependencyMap::new(),
        });

    assert_eq!(
        declared(&definition, &json!({ "backend": "postgres" })),
        vec![
            ("audit".to_string(), "audit.log".to_string()),
            ("store".to_string(), "postgres".to_string()),
        ]
    );
    assert_eq!(
        declared(&definition, &Value::Null),
        vec![
            ("audit".to_string(), "audit.log".to_string()),
            ("store".to_string(), "memory".to_string()),
        ]
    );
}
