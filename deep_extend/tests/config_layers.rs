//! Behavioural tests for configuration layering, dispatch, and call-scoped
//! state: derive precedence, delegation to the next layer up, kind-dispatch
//! instrumentation, recursion-depth tracking, and the global/local bags.

use deep_extend::{
    ExtendConfig, ExtendError, ExtendResult, Kind, Overrides, Tier, Value, extend,
};
use serde_json::json;
use test_helpers::{CallLog, val};

#[test]
fn later_override_tables_take_precedence() -> ExtendResult<()> {
    let config = ExtendConfig::new().derive_all([
        Overrides::new().deep(true).max_recursions(5),
        Overrides::new().deep(false),
    ]);
    assert!(!config.deep());
    assert_eq!(config.max_recursions(), 5);
    assert_eq!(config.tier(), Tier::Static);
    Ok(())
}

#[test]
fn derived_leaf_does_not_change_its_ancestor() {
    let base = ExtendConfig::with(Overrides::new().deep(true));
    let leaf = base.derive(Overrides::new().deep(false));
    assert!(base.deep());
    assert!(!leaf.deep());
}

#[test]
fn kind_dispatch_fires_exactly_one_handler_per_property() -> ExtendResult<()> {
    let log = CallLog::new();
    let similar = log.clone();
    let different = log.clone();
    let config = ExtendConfig::with(
        Overrides::new()
            .kind_handler(Kind::Object, move |run, pair| {
                similar.record(format!("object:{}", pair.name));
                run.call_next(pair)
            })
            .different_handler(move |run, pair| {
                different.record(format!("different:{}", pair.name));
                run.call_next(pair)
            }),
    );

    // `same` pairs two objects, `diff` pairs a string with a number.
    let merged = extend(
        &config,
        val(json!({"same": {"x": 1}, "diff": "text"})),
        [val(json!({"same": {"y": 2}, "diff": 7}))],
    )?;

    assert_eq!(merged, val(json!({"same": {"y": 2}, "diff": 7})));
    let mut firings = log.snapshot();
    firings.sort();
    assert_eq!(firings, vec!["different:diff", "object:same"]);
    Ok(())
}

#[test]
fn call_next_reaches_the_default_policy() -> ExtendResult<()> {
    // Run the default deep merge, then also record a marker: additive
    // composition over the layer below.
    let config = ExtendConfig::with(Overrides::new().deep(true).kind_handler(
        Kind::Object,
        |run, pair| {
            let mut result = run.call_next(pair)?.unwrap_or(Value::Undefined);
            result.set_prop("touched", true);
            Ok(Some(result))
        },
    ));

    let merged = extend(
        &config,
        val(json!({"a": {"x": 1}})),
        [val(json!({"a": {"y": 2}}))],
    )?;
    assert_eq!(merged, val(json!({"a": {"x": 1, "y": 2, "touched": true}})));
    Ok(())
}

#[test]
fn call_next_walks_through_intermediate_layers() -> ExtendResult<()> {
    let log = CallLog::new();
    let outer_log = log.clone();
    let inner_log = log.clone();
    let config = ExtendConfig::new()
        .derive(Overrides::new().default_handler(move |run, pair| {
            inner_log.record("inner");
            run.call_next(pair)
        }))
        .derive(Overrides::new().default_handler(move |run, pair| {
            outer_log.record("outer");
            run.call_next(pair)
        }));

    // Both values are numbers, so dispatch falls through to the layered
    // `Default` handlers.
    let merged = extend(&config, val(json!({"a": 0})), [val(json!({"a": 1}))])?;
    assert_eq!(merged, val(json!({"a": 1})));
    assert_eq!(log.snapshot(), vec!["outer", "inner"]);
    Ok(())
}

#[test]
fn call_next_outside_dispatch_is_a_configuration_error() {
    let config = ExtendConfig::with(Overrides::new().get_second(|run, source, name, _target| {
        let pair = deep_extend::Pair {
            first: Value::Undefined,
            second: Value::Undefined,
            name,
            target: source,
            source,
        };
        run.call_next(pair)?;
        Ok(Value::Undefined)
    }));
    let result = extend(&config, val(json!({})), [val(json!({"a": 1}))]);
    let err = result.expect_err("call_next with no active dispatch must fail");
    assert!(matches!(err.as_ref(), ExtendError::MissingMethod { .. }));
}

#[test]
fn recursion_level_is_visible_to_accessors() -> ExtendResult<()> {
    // Depth probe: the incoming-value accessor annotates each target it
    // passes through with the level it observed.
    let config = ExtendConfig::with(
        Overrides::new()
            .deep(true)
            .get_second(|run, source, name, target| {
                target.set_prop("level", run.level());
                Ok(source.get_prop(name).cloned().unwrap_or(Value::Undefined))
            }),
    );

    let merged = extend(
        &config,
        val(json!({})),
        [
            val(json!({"a": {"a": {"a": 1}}})),
            val(json!({"a": {"a": {"a": 2}}})),
        ],
    )?;
    assert_eq!(
        merged,
        val(json!({
            "level": 0,
            "a": {"level": 1, "a": {"level": 2, "a": 2}}
        })),
    );
    Ok(())
}

#[test]
fn recursion_ceiling_is_enforced() {
    let nested = (0..25).fold(json!(1), |acc, _| json!({"a": acc}));
    let result = extend(true, val(json!({})), [val(nested)]);
    let err = result.expect_err("25 nested levels must exceed the default ceiling");
    assert!(matches!(
        err.as_ref(),
        ExtendError::RecursionLimit { limit: 20 }
    ));
}

#[test]
fn recursion_ceiling_is_configurable() -> ExtendResult<()> {
    let nested = (0..25).fold(json!(1), |acc, _| json!({"a": acc}));
    let config = ExtendConfig::with(Overrides::new().deep(true).max_recursions(50));
    let merged = extend(&config, val(json!({})), [val(nested.clone())])?;
    assert_eq!(merged, val(nested));
    Ok(())
}

#[test]
fn global_bag_is_shared_across_the_whole_call() -> ExtendResult<()> {
    // Count visited objects in the global bag; surface the count from the
    // finish hook of the outermost invocation only.
    let config = ExtendConfig::with(
        Overrides::new()
            .deep(true)
            .kind_handler(Kind::Object, |run, pair| {
                let count = run
                    .global()
                    .get("objects")
                    .and_then(|v| match v {
                        Value::Number(n) => n.as_i64(),
                        _ => None,
                    })
                    .unwrap_or(0);
                run.global().insert("objects".to_owned(), Value::from(count + 1));
                run.call_next(pair)
            })
            .finish(|run, mut target| {
                if run.level() == 0 {
                    let count = run.global().get("objects").cloned();
                    target.set_prop("visited", count.unwrap_or(Value::from(0)));
                }
                Ok(target)
            }),
    );

    // Into an empty target every pairing is "different", so the counter
    // never moves.
    let untouched = extend(
        &config,
        val(json!({})),
        [val(json!({"a": {"b": {"c": 1}}, "d": {"e": 2}}))],
    )?;
    assert_eq!(untouched.get_prop("visited"), Some(&Value::from(0)));

    // With a prepared target the same shape pairs objects at every level.
    let merged = extend(
        &config,
        val(json!({"a": {"b": {}}, "d": {}})),
        [val(json!({"a": {"b": {"c": 1}}, "d": {"e": 2}}))],
    )?;
    assert_eq!(
        merged.get_prop("visited"),
        Some(&Value::from(3)),
        "a, a.b and d pair as objects"
    );
    Ok(())
}

#[test]
fn local_bag_is_cloned_per_recursion_level() -> ExtendResult<()> {
    let log = CallLog::new();
    let seen = log.clone();
    let config = ExtendConfig::with(Overrides::new().deep(true).kind_handler(
        Kind::Object,
        move |run, pair| {
            let inherited = run
                .local()
                .get("depth")
                .and_then(|v| match v {
                    Value::Number(n) => n.as_i64(),
                    _ => None,
                });
            let level = run.level();
            seen.record(format!("enter level={level} inherited={inherited:?}"));
            run.local().insert("depth".to_owned(), Value::from(level));
            let result = run.call_next(pair)?;
            let after = run
                .local()
                .get("depth")
                .and_then(|v| match v {
                    Value::Number(n) => n.as_i64(),
                    _ => None,
                });
            seen.record(format!("exit level={level} local={after:?}"));
            Ok(result)
        },
    ));

    extend(
        &config,
        val(json!({"a": {"b": {}}})),
        [val(json!({"a": {"b": {"c": 1}}}))],
    )?;

    // The nested handler inherits the parent's entry through the clone,
    // and its own write never leaks back up.
    assert_eq!(
        log.snapshot(),
        vec![
            "enter level=0 inherited=None",
            "enter level=1 inherited=Some(0)",
            "exit level=1 local=Some(1)",
            "exit level=0 local=Some(0)",
        ],
    );
    Ok(())
}

#[test]
fn enumeration_can_be_overridden() -> ExtendResult<()> {
    let config = ExtendConfig::with(Overrides::new().get_props(|_run, source, _target| {
        Ok(source
            .prop_names()
            .into_iter()
            .filter(|name| name != "internal")
            .collect())
    }));
    let merged = extend(
        &config,
        val(json!({})),
        [val(json!({"a": 1, "internal": 2}))],
    )?;
    assert_eq!(merged, val(json!({"a": 1})));
    Ok(())
}

#[test]
fn bare_overrides_work_as_leading_config() -> ExtendResult<()> {
    let merged = extend(
        Overrides::new().deep(true),
        val(json!({})),
        [val(json!({"a": {"x": 1}})), val(json!({"a": {"y": 2}}))],
    )?;
    assert_eq!(merged, val(json!({"a": {"x": 1, "y": 2}})));
    Ok(())
}

#[test]
fn bad_target_is_rejected() {
    let result = extend((), Value::from("nope"), [val(json!({}))]);
    let err = result.expect_err("string target must be rejected");
    assert!(matches!(
        err.as_ref(),
        ExtendError::BadTarget {
            found: Kind::String
        }
    ));
}
