//! Unit tests for the unit registry

use serde_json::{Value, json};
use weft_application::registry::RegistryBuilder;
use weft_domain::entities::{
    Composition, NotificationDefinition, OperationDefinition, SingletonDefinition, TagDefinition,
    UnitDefinition,
};
use weft_domain::error::Error;
use weft_domain::value_objects::{UnitId, UnitKind};

fn op(id: &str, marker: &'static str) -> UnitDefinition {
    OperationDefinition::new(id, move |_input, _ctx| async move { Ok(json!(marker)) })
        .with_config(json!({ "marker": marker }))
        .into()
}

#[test]
fn test_registration_order_is_preserved() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(vec![
            op("b", "b"),
            op("a", "a"),
            NotificationDefinition::new("c").into(),
        ])
        .expect("register");

    let registry = builder.seal();
    let ids: Vec<&str> = registry.iter().map(|u| u.id().as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert_eq!(registry.position("a"), Some(1));
}

#[test]
fn test_override_replaces_definition_and_keeps_slot() {
    let mut builder = RegistryBuilder::new().log_overrides(false);
    builder
        .register(vec![op("users.get", "v1"), op("users.list", "v1")])
        .expect("register");
    builder.register(vec![op("users.get", "v2")]).expect("override");

    let registry = builder.seal();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.position("users.get"), Some(0));
    let config = &registry.get("users.get").expect("registered").header().config;
    assert_eq!(config["marker"], "v2");
}

#[test]
fn test_override_with_different_kind_is_rejected() {
    let mut builder = RegistryBuilder::new();
    builder.register(vec![op("db", "op")]).expect("register");

    let err = builder
        .register(vec![SingletonDefinition::new("db", |_ctx| async { Ok(()) }).into()])
        .expect_err("kind conflict");
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_get_unknown_returns_none() {
    let registry = RegistryBuilder::new().seal();
    assert!(registry.get("missing").is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_root_composition_is_flattened() {
    let root = Composition::new("app")
        .with(OperationDefinition::new("api", |input: Value, _ctx| async move { Ok(input) }))
        .include(Composition::new("storage").with(SingletonDefinition::new("db", |_ctx| async {
            Ok(())
        })));

    let mut builder = RegistryBuilder::new();
    builder.register_root(root).expect("root");
    let registry = builder.seal();

    assert_eq!(registry.root().map(|id| id.as_str()), Some("app"));
    assert_eq!(registry.ids_of(UnitKind::Singleton), vec![UnitId::from("db")]);
    assert_eq!(registry.ids_of(UnitKind::Operation), vec![UnitId::from("api")]);
}

#[test]
fn test_duplicate_root_is_rejected() {
    let mut builder = RegistryBuilder::new();
    builder.register_root(Composition::new("app")).expect("first root");

    let err = builder
        .register_root(Composition::new("app"))
        .expect_err("second root");
    assert!(matches!(err, Error::DuplicateRoot { ref id } if id == "app"));
}

#[test]
fn test_tagged_with_lists_carriers_in_order() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(vec![
            TagDefinition::new("http.handler").into(),
            OperationDefinition::new("users.get", |i, _c| async move { Ok(i) })
                .tagged("http.handler")
                .into(),
            OperationDefinition::new("internal", |i, _c| async move { Ok(i) }).into(),
            OperationDefinition::new("users.list", |i, _c| async move { Ok(i) })
                .tagged("http.handler")
                .into(),
        ])
        .expect("register");

    let registry = builder.seal();
    assert_eq!(
        registry.tagged_with(&"http.handler".into()),
        vec![UnitId::from("users.get"), UnitId::from("users.list")]
    );
}
