//! Behavioural tests for the dynamic entry point and its leading-argument
//! rules.

use deep_extend::{
    ExtendArg, ExtendConfig, ExtendError, ExtendResult, Kind, Overrides, Value,
    extend_from_args, prepare_arguments,
};
use rstest::rstest;
use serde_json::json;
use test_helpers::val;

#[test]
fn leading_boolean_enables_deep_merge() -> ExtendResult<()> {
    let merged = extend_from_args(vec![
        ExtendArg::from(true),
        ExtendArg::from(json!({})),
        ExtendArg::from(json!({"a": {"x": 1}})),
        ExtendArg::from(json!({"a": {"y": 2}})),
    ])?;
    assert_eq!(merged, val(json!({"a": {"x": 1, "y": 2}})));
    Ok(())
}

#[test]
fn leading_configuration_is_recognised() -> ExtendResult<()> {
    let config = ExtendConfig::with(Overrides::new().deep(true));
    let merged = extend_from_args(vec![
        ExtendArg::from(&config),
        ExtendArg::from(json!({})),
        ExtendArg::from(json!({"a": {"x": 1}})),
        ExtendArg::from(json!({"a": {"y": 2}})),
    ])?;
    assert_eq!(merged, val(json!({"a": {"x": 1, "y": 2}})));
    Ok(())
}

#[test]
fn without_leading_config_the_first_value_is_the_target() -> ExtendResult<()> {
    let merged = extend_from_args(vec![
        ExtendArg::from(json!({"a": 1})),
        ExtendArg::from(json!({"b": 2})),
    ])?;
    assert_eq!(merged, val(json!({"a": 1, "b": 2})));
    Ok(())
}

#[test]
fn two_leading_configurations_are_ambiguous() {
    let first = ExtendConfig::new();
    let second = ExtendConfig::with(Overrides::new().deep(true));
    let result = extend_from_args(vec![
        ExtendArg::from(first),
        ExtendArg::from(second),
        ExtendArg::from(json!({})),
    ]);
    let err = result.expect_err("two leading configs must be rejected");
    assert!(matches!(err.as_ref(), ExtendError::AmbiguousConfig));
}

#[test]
fn a_configuration_among_the_sources_is_ambiguous() {
    let result = prepare_arguments(vec![
        ExtendArg::from(json!({})),
        ExtendArg::from(json!({"a": 1})),
        ExtendArg::from(ExtendConfig::new()),
    ]);
    assert!(matches!(
        result.expect_err("must be rejected").as_ref(),
        ExtendError::AmbiguousConfig
    ));
}

#[rstest]
#[case::boolean_target(vec![ExtendArg::from(true), ExtendArg::from(false)], Kind::Boolean)]
#[case::string_target(vec![ExtendArg::from(true), ExtendArg::from(json!("nope"))], Kind::String)]
#[case::numeric_target(vec![ExtendArg::from(json!(5))], Kind::Number)]
#[case::missing_target(vec![ExtendArg::from(true)], Kind::Undefined)]
fn targets_that_cannot_carry_properties_are_rejected(
    #[case] args: Vec<ExtendArg>,
    #[case] expected: Kind,
) {
    let err = prepare_arguments(args).expect_err("target must be rejected");
    match err.as_ref() {
        ExtendError::BadTarget { found } => assert_eq!(*found, expected),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn split_arguments_round_trip() -> ExtendResult<()> {
    let (config, target, sources) = prepare_arguments(vec![
        ExtendArg::from(true),
        ExtendArg::from(json!({"t": 1})),
        ExtendArg::from(json!({"s": 2})),
        ExtendArg::from(json!({"s": 3})),
    ])?;
    assert!(config.deep());
    assert_eq!(target, val(json!({"t": 1})));
    assert_eq!(sources, vec![val(json!({"s": 2})), val(json!({"s": 3}))]);
    Ok(())
}

#[test]
fn boolean_sources_are_tolerated() -> ExtendResult<()> {
    // A truthy non-container source has no enumerable properties; it must
    // simply contribute nothing.
    let merged = extend_from_args(vec![
        ExtendArg::from(json!({"a": 1})),
        ExtendArg::from(Value::Bool(true)),
    ])?;
    assert_eq!(merged, val(json!({"a": 1})));
    Ok(())
}
