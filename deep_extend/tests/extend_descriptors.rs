//! Behavioural tests for descriptor-wise merging: accessor preservation,
//! attribute handling, non-enumerable properties, and nested recursion.

use anyhow::Result;
use deep_extend::{
    Descriptor, Func, Object, Overrides, PropData, Value, extend, extend_descriptors,
};
use serde_json::json;
use test_helpers::val;

fn getter_fn(label: &'static str, result: &'static str) -> Func {
    Func::new(label, move |_run, _args| Ok(Value::from(result)))
}

fn with_accessor(name: &str, get: Option<Func>, set: Option<Func>) -> Value {
    let mut obj = Object::new();
    obj.define(name, Descriptor::accessor(get, set));
    Value::Object(obj)
}

#[test]
fn accessor_slots_survive_the_merge() -> Result<()> {
    let getter = getter_fn("get-answer", "42");
    let source = with_accessor("answer", Some(getter.clone()), None);

    let merged = extend_descriptors((), val(json!({"answer": 1})), [source])?;
    let descriptor = merged.descriptor("answer").expect("property must exist");
    assert!(descriptor.is_accessor());
    match descriptor.data {
        PropData::Accessor(accessor) => {
            let preserved = accessor.get.expect("getter must be preserved");
            assert!(preserved.ptr_eq(&getter));
        }
        PropData::Value(_) => panic!("expected an accessor descriptor"),
    }
    Ok(())
}

#[test]
fn plain_values_keep_the_incoming_attributes() -> Result<()> {
    let mut source = Object::new();
    source.define(
        "hidden",
        Descriptor {
            data: PropData::Value(val(json!(7))),
            enumerable: false,
            writable: false,
            configurable: true,
        },
    );

    let merged = extend_descriptors((), val(json!({"hidden": 1})), [Value::Object(source)])?;
    let descriptor = merged.descriptor("hidden").expect("property must exist");
    assert_eq!(descriptor.data, PropData::Value(val(json!(7))));
    assert!(!descriptor.enumerable);
    assert!(!descriptor.writable);
    Ok(())
}

#[test]
fn non_enumerable_properties_are_visited() -> Result<()> {
    let mut source = Object::new();
    source.define(
        "quiet",
        Descriptor {
            data: PropData::Value(val(json!("here"))),
            enumerable: false,
            writable: true,
            configurable: true,
        },
    );
    let source = Value::Object(source);

    // The ordinary engine never sees the property...
    let plain = extend((), val(json!({})), [source.clone()])?;
    assert_eq!(plain.descriptor("quiet"), None);

    // ...the descriptors variant does.
    let merged = extend_descriptors((), val(json!({})), [source])?;
    assert_eq!(
        merged.descriptor("quiet").map(|d| d.data),
        Some(PropData::Value(val(json!("here")))),
    );
    Ok(())
}

#[test]
fn accessor_pairs_replace_by_default() -> Result<()> {
    let old_get = getter_fn("old-get", "old");
    let old_set = getter_fn("old-set", "old");
    let new_get = getter_fn("new-get", "new");

    let target = with_accessor("prop", Some(old_get), Some(old_set));
    let source = with_accessor("prop", Some(new_get.clone()), None);

    let merged = extend_descriptors((), target, [source])?;
    match merged.descriptor("prop").expect("property must exist").data {
        PropData::Accessor(accessor) => {
            assert!(accessor.get.expect("getter").ptr_eq(&new_get));
            assert!(accessor.set.is_none(), "incoming descriptor wins wholesale");
        }
        PropData::Value(_) => panic!("expected an accessor descriptor"),
    }
    Ok(())
}

#[test]
fn descriptors_deep_combines_accessor_halves() -> Result<()> {
    let old_get = getter_fn("old-get", "old");
    let old_set = getter_fn("old-set", "old");
    let new_get = getter_fn("new-get", "new");

    let target = with_accessor("prop", Some(old_get), Some(old_set.clone()));
    let source = with_accessor("prop", Some(new_get.clone()), None);

    let merged = extend_descriptors(
        Overrides::new().descriptors_deep(true),
        target,
        [source],
    )?;
    match merged.descriptor("prop").expect("property must exist").data {
        PropData::Accessor(accessor) => {
            assert!(accessor.get.expect("getter").ptr_eq(&new_get));
            assert!(
                accessor.set.expect("setter").ptr_eq(&old_set),
                "missing halves fall back to the current descriptor"
            );
        }
        PropData::Value(_) => panic!("expected an accessor descriptor"),
    }
    Ok(())
}

#[test]
fn nested_containers_merge_descriptor_wise_under_deep() -> Result<()> {
    let merged = extend_descriptors(
        true,
        val(json!({"a": {"x": 1}})),
        [val(json!({"a": {"y": 2}}))],
    )?;
    assert_eq!(merged, val(json!({"a": {"x": 1, "y": 2}})));
    Ok(())
}

#[test]
fn mismatched_descriptor_shapes_take_the_incoming_one() -> Result<()> {
    let source = with_accessor("prop", Some(getter_fn("get", "x")), None);
    let merged = extend_descriptors((), val(json!({"prop": 5})), [source])?;
    assert!(
        merged
            .descriptor("prop")
            .expect("property must exist")
            .is_accessor(),
    );
    Ok(())
}
