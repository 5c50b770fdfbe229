//! Behavioural tests for property decorators: transformer ordering, the
//! standard decoration library, per-property configuration overrides, and
//! metadata propagation when resolution is deferred.

use deep_extend::decorator::{decorate, library};
use deep_extend::{
    Decoration, ExtendError, ExtendResult, Func, Object, Overrides, Value, extend,
};
use serde_json::json;
use test_helpers::{obj, val};

fn suffixer(suffix: &'static str) -> Decoration {
    Decoration::transform(move |_run, current, _target, _source, _name| {
        let mut s = current.as_str().unwrap_or_default().to_owned();
        s.push_str(suffix);
        Ok(Value::String(s))
    })
}

#[test]
fn transformers_apply_in_registration_order() -> ExtendResult<()> {
    // For T1 registered before T2 the resolved value is T2(T1(raw)).
    let mut source = obj(json!({"s": "x"}));
    decorate(&mut source, "s", suffixer("-t1"))?;
    decorate(&mut source, "s", suffixer("-t2"))?;

    let merged = extend((), val(json!({})), [Value::Object(source)])?;
    assert_eq!(merged, val(json!({"s": "x-t1-t2"})));
    Ok(())
}

#[test]
fn getter_decorator_resolves_property_functions() -> ExtendResult<()> {
    let mut source = Object::new();
    source.insert(
        "str",
        Func::new("str", |_run, _args| Ok(Value::from("test"))),
    );
    decorate(&mut source, "str", library::getter())?;

    let merged = extend((), val(json!({})), [Value::Object(source)])?;
    assert_eq!(merged, val(json!({"str": "test"})));
    Ok(())
}

#[test]
fn skip_decorator_suppresses_the_property() -> ExtendResult<()> {
    let mut source = obj(json!({"keep": 1, "drop": 2}));
    decorate(&mut source, "drop", library::skip())?;

    let merged = extend((), val(json!({"drop": "old"})), [Value::Object(source)])?;
    assert_eq!(merged, val(json!({"keep": 1, "drop": "old"})));
    Ok(())
}

#[test]
fn concat_decorators_drive_per_property_dispatch() -> ExtendResult<()> {
    let mut a = obj(json!({"arr": [1, 2]}));
    decorate(&mut a, "arr", library::concat_reverse())?;
    let mut b = obj(json!({"arr": [3, 4]}));
    decorate(&mut b, "arr", library::concat())?;

    let forward = extend(
        (),
        val(json!({})),
        [Value::Object(a.clone()), Value::Object(b.clone())],
    )?;
    assert_eq!(forward, val(json!({"arr": [1, 2, 3, 4]})));

    let reverse = extend((), val(json!({})), [Value::Object(b), Value::Object(a)])?;
    assert_eq!(reverse, val(json!({"arr": [1, 2, 3, 4]})));
    Ok(())
}

#[test]
fn deep_decorator_overrides_a_shallow_call() -> ExtendResult<()> {
    let mut source = obj(json!({"nested": {"y": 2}, "plain": {"y": 2}}));
    decorate(&mut source, "nested", library::deep())?;

    let merged = extend(
        (),
        val(json!({"nested": {"x": 1}, "plain": {"x": 1}})),
        [Value::Object(source)],
    )?;
    assert_eq!(
        merged,
        val(json!({"nested": {"x": 1, "y": 2}, "plain": {"y": 2}})),
    );
    Ok(())
}

#[test]
fn unresolved_merge_keeps_raw_values_and_merges_records() -> ExtendResult<()> {
    let mut a = obj(json!({"arr": [1, 2]}));
    decorate(&mut a, "arr", library::concat())?;
    let mut b = obj(json!({"arr": [3, 4]}));
    decorate(&mut b, "arr", library::concat_reverse())?;

    let merged = extend(
        Overrides::new().resolve(false),
        val(json!({})),
        [Value::Object(a), Value::Object(b)],
    )?;

    // Raw last-source value wins while resolution is deferred.
    assert_eq!(merged.get_prop("arr"), Some(&val(json!([3, 4]))));
    // Both property records survive on the result's metadata.
    let meta = merged
        .as_object()
        .and_then(Object::decorators)
        .expect("metadata must be propagated");
    assert!(meta.config("arr").is_some());

    // Resolving later runs both recorded handlers as a pipeline: concat
    // first, then concat_reverse consuming its output.
    let resolved = extend((), val(json!({"arr": [9]})), [merged])?;
    assert_eq!(resolved, val(json!({"arr": [9, 3, 4, 9]})));
    Ok(())
}

#[test]
fn unresolved_then_resolved_matches_inline_resolution() -> ExtendResult<()> {
    let make_source = || -> ExtendResult<Object> {
        let mut source = Object::new();
        source.insert(
            "str",
            Func::new("str", |_run, _args| Ok(Value::from("test"))),
        );
        source.insert("arr", val(json!([1, 2])));
        decorate(&mut source, "str", library::getter())?;
        decorate(&mut source, "arr", library::concat())?;
        Ok(source)
    };

    let inline = extend((), val(json!({})), [Value::Object(make_source()?)])?;

    let unresolved = extend(
        Overrides::new().resolve(false),
        val(json!({})),
        [Value::Object(make_source()?)],
    )?;
    let roundtrip = extend((), val(json!({})), [unresolved])?;

    assert_eq!(roundtrip, inline);
    assert_eq!(roundtrip, val(json!({"str": "test", "arr": [1, 2]})));
    Ok(())
}

#[test]
fn plain_reassignment_on_a_later_source_drops_stale_records() -> ExtendResult<()> {
    let mut a = Object::new();
    a.insert(
        "str",
        Func::new("a-str", |_run, _args| Ok(Value::from("test"))),
    );
    a.insert("arr", val(json!([5, 6])));
    decorate(&mut a, "str", library::getter())?;
    decorate(&mut a, "arr", library::concat())?;

    // `b` re-declares `str` as a plain, undecorated function but keeps a
    // decorated `arr`.
    let mut b = Object::new();
    b.insert(
        "str",
        Func::new("b-str", |_run, _args| Ok(Value::from("other"))),
    );
    b.insert("arr", val(json!([1, 2])));
    decorate(&mut b, "arr", library::concat_reverse())?;

    let merged = extend(
        Overrides::new().resolve(false),
        val(json!({})),
        [Value::Object(a), Value::Object(b)],
    )?;

    let meta = merged
        .as_object()
        .and_then(Object::decorators)
        .expect("metadata must be propagated");
    assert!(
        meta.transformers("str").is_none(),
        "records for a plainly reassigned property are dropped"
    );
    assert!(meta.config("arr").is_some());
    Ok(())
}

#[test]
fn direct_reassignment_clears_decorator_records() -> ExtendResult<()> {
    let mut source = obj(json!({"arr": [1]}));
    decorate(&mut source, "arr", library::concat())?;
    assert!(source.decorators().is_some());

    source.insert("arr", val(json!([7])));
    assert!(
        source.decorators().is_none(),
        "reassigning the only decorated property clears the store"
    );
    Ok(())
}

#[test]
fn forbidden_methods_are_rejected_at_decoration_time() {
    let mut source = obj(json!({"a": 1}));

    let err = decorate(
        &mut source,
        "a",
        Decoration::config(Overrides::new().get_props(|_run, source, _target| {
            Ok(source.prop_names())
        })),
    )
    .expect_err("get_props must be rejected");
    assert!(matches!(
        err.as_ref(),
        ExtendError::ForbiddenDecoratorMethod { .. }
    ));

    let err = decorate(
        &mut source,
        "a",
        Decoration::config(Overrides::new().get_second(|_run, source, name, _target| {
            Ok(source.get_prop(name).cloned().unwrap_or(Value::Undefined))
        })),
    )
    .expect_err("get_second must be rejected");
    assert!(matches!(
        err.as_ref(),
        ExtendError::ForbiddenDecoratorMethod { .. }
    ));
}
