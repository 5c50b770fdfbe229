//! Unit tests for metadata mechanics: system-property filtering, override
//! composition, and record propagation rules.

use serde_json::json;

use crate::config::{ExtendConfig, Method, Overrides, Pair};
use crate::runtime::{EngineKind, Run};
use crate::value::{Kind, Object, Value};

use super::{
    METADATA_PROP, decorate, filter_system_properties, library, merge_metadata_into,
    merge_override,
};

#[test]
fn the_metadata_name_is_filtered_from_enumeration_output() {
    let names = vec![
        "a".to_owned(),
        METADATA_PROP.to_owned(),
        "b".to_owned(),
    ];
    assert_eq!(filter_system_properties(names), vec!["a", "b"]);
}

#[test]
fn same_method_overrides_compose_into_a_pipeline() {
    let mut into = Overrides::new().kind_handler(Kind::Array, |_run, pair| {
        let mut items = pair.first.as_array().unwrap_or_default().to_vec();
        items.extend(pair.second.as_array().unwrap_or_default().to_vec());
        Ok(Some(Value::Array(items)))
    });
    let incoming = Overrides::new().deep(true).kind_handler(Kind::Array, |_run, pair| {
        // Sees the first handler's output as its incoming value.
        let mut items = pair.second.as_array().unwrap_or_default().to_vec();
        items.push(Value::from("tail"));
        Ok(Some(Value::Array(items)))
    });
    merge_override(&mut into, &incoming);
    assert_eq!(into.deep, Some(true));

    let composed = into
        .handlers
        .get(&Method::Kind(Kind::Array))
        .expect("handler survives the merge")
        .clone();
    let mut run = Run::new(EngineKind::Sync, ExtendConfig::new());
    let target = Value::from(json!({}));
    let source = Value::from(json!({}));
    let result = composed(
        &mut run,
        Pair {
            first: Value::from(json!([1])),
            second: Value::from(json!([2])),
            name: "arr",
            target: &target,
            source: &source,
        },
    )
    .expect("composed handler runs");
    assert_eq!(result, Some(Value::from(json!([1, 2, "tail"]))));
}

#[test]
fn propagation_seeds_an_undecorated_target() {
    let mut source = Object::new();
    source.insert("arr", Value::from(json!([1])));
    decorate(&mut source, "arr", library::concat()).expect("decoration succeeds");

    let mut target = Value::from(json!({"arr": [0]}));
    merge_metadata_into(&mut target, &Value::Object(source));

    let meta = target
        .as_object()
        .and_then(Object::decorators)
        .expect("records arrive on the target");
    assert!(meta.config("arr").is_some());
}

#[test]
fn propagation_drops_records_for_plainly_overwritten_properties() {
    let mut first = Object::new();
    first.insert("a", 1);
    decorate(&mut first, "a", library::concat()).expect("decoration succeeds");
    let mut target = Value::Object(first);

    // The source redefines `a` as a plain value and carries no records of
    // its own for it.
    let mut source = Object::new();
    source.insert("a", 2);
    source.insert("b", 3);
    decorate(&mut source, "b", library::concat()).expect("decoration succeeds");

    merge_metadata_into(&mut target, &Value::Object(source));
    let meta = target
        .as_object()
        .and_then(Object::decorators)
        .expect("surviving records remain");
    assert!(meta.config("a").is_none(), "overwritten record is dropped");
    assert!(meta.config("b").is_some());
}
