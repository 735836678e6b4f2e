//! The harness testing itself.
//!
//! [`suite`] registers the module `test/harness`, which exercises every assertion through the runner. The
//! `taptest` binary runs it by default.

use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::assert::{
    AssertResultExt, deep_equal, equal, not_deep_equal, not_equal, not_ok, ok, rejects, rejects_matching, throws,
    throws_matching,
};
use crate::failure::TestResult;
use crate::matcher::{Matcher, RaisedError};
use crate::suite::{Suite, SuiteBuilder};
use taptest_core::{Class, Value};

#[derive(Debug, Error)]
#[error("{0}")]
struct PlainError(String);

#[derive(Debug, Error)]
#[error("{0}")]
struct CustomError(String);

fn raise(message: &str) -> Result<(), PlainError> {
    Err(PlainError(message.to_string()))
}

fn message_is(expected: &'static str) -> Matcher {
    Matcher::predicate(move |e: &RaisedError| e.to_string() == expected)
}

fn now() -> Value {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or_default();
    Value::date(millis)
}

fn empty_object() -> Value {
    Value::object(Vec::<(&str, Value)>::new())
}

fn empty_array() -> Value {
    Value::array(Vec::<Value>::new())
}

async fn equal_values() -> TestResult {
    equal(1, 1).with_message("numbers")?;
    equal("a", "a").with_message("string")?;
    equal("", "").with_message("empty string")?;
    equal(true, true).with_message("true")?;
    equal(false, false).with_message("false")?;
    equal(Value::Null, Value::Null).with_message("null")?;
    equal(f64::NAN, f64::NAN).with_message("NaN")?;
    equal(0, 0).with_message("zero")?;
    equal((), ()).with_message("undefined")?;

    let a = empty_object();
    let b = empty_array();
    let c = Value::host(|| {});
    let d = Value::host(Regex::new("foo")?);
    let e = now();

    equal(&a, &a).with_message("object")?;
    equal(&b, &b).with_message("array")?;
    equal(&c, &c).with_message("function")?;
    equal(&d, &d).with_message("regex")?;
    equal(&e, &e).with_message("date")?;
    Ok(())
}

async fn not_equal_values() -> TestResult {
    not_equal(1, 2).with_message("numbers")?;
    not_equal("a", "b").with_message("string")?;
    not_equal("", "a").with_message("empty string")?;
    not_equal(true, false).with_message("boolean")?;
    not_equal(Value::Null, ()).with_message("null")?;
    not_equal((), Value::Null).with_message("undefined")?;
    not_equal(0.0, -0.0).with_message("zeros mixed")?;
    not_equal(Value::symbol("foo"), Value::symbol("foo")).with_message("symbol")?;
    not_equal(empty_object(), empty_object()).with_message("object")?;
    not_equal(empty_array(), empty_array()).with_message("array")?;
    not_equal(Value::host(|| {}), Value::host(|| {})).with_message("function")?;
    not_equal(Value::host(Regex::new("foo")?), Value::host(Regex::new("foo")?)).with_message("regex")?;
    not_equal(now(), now()).with_message("date")?;
    Ok(())
}

async fn deep_equal_values() -> TestResult {
    deep_equal(empty_object(), empty_object())?;
    deep_equal(Value::object([("foo", 1)]), Value::object([("foo", 1)]))?;
    deep_equal(
        Value::object([("foo", Value::object([("bar", 1)]))]),
        Value::object([("foo", Value::object([("bar", 1)]))]),
    )?;
    deep_equal(empty_array(), empty_array())?;
    deep_equal(Value::array([1, 2, 3]), Value::array([1, 2, 3]))?;
    deep_equal(Value::array(["a", "b", "c"]), Value::array(["a", "b", "c"]))?;
    deep_equal(
        Value::array([Value::object([("foo", 1)]), Value::object([("bar", 2)])]),
        Value::array([Value::object([("foo", 1)]), Value::object([("bar", 2)])]),
    )?;
    let nested = || {
        Value::array([
            Value::object([("foo", Value::object([("bar", 1)]))]),
            Value::object([("baz", Value::object([("qux", 2)]))]),
        ])
    };
    deep_equal(nested(), nested())?;
    let cube = || Value::array([Value::array([Value::array([1, 2, 3])])]);
    deep_equal(cube(), cube())?;
    deep_equal(Value::date(5.0), Value::date(5.0)).with_message("date timestamps")?;
    deep_equal(Value::object([("a", 1), ("b", 2)]), Value::object([("b", 2), ("a", 1)]))
        .with_message("key order")?;
    Ok(())
}

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
    label: Option<String>,
}

async fn deep_equal_serialized() -> TestResult {
    let point = Value::from_serialize(&Point {
        x: 1,
        y: 2,
        label: None,
    })?;
    deep_equal(&point, Value::object([("y", Value::from(2)), ("x", 1.into()), ("label", Value::Null)]))?;
    deep_equal(&point, Value::from(json!({ "label": null, "x": 1, "y": 2 })))?;
    not_deep_equal(&point, Value::from(json!({ "x": 1, "y": 2 }))).with_message("missing key")?;
    Ok(())
}

async fn not_deep_equal_values() -> TestResult {
    not_deep_equal(
        Value::object([("foo", Value::object([("bar", 1)]))]),
        Value::object([("baz", Value::object([("qux", 2)]))]),
    )?;
    let point = Class::new("Point");
    not_deep_equal(Value::instance(&point, [("x", 1)]), Value::object([("x", 1)])).with_message("prototype")?;
    not_deep_equal(Value::array([1]), Value::object([("0", 1)])).with_message("array and object")?;
    Ok(())
}

async fn truthiness() -> TestResult {
    ok(1)?;
    ok("a")?;
    ok(empty_object())?;
    ok(empty_array())?;
    not_ok(0)?;
    not_ok(-0.0)?;
    not_ok(f64::NAN)?;
    not_ok("")?;
    not_ok(Value::Null)?;
    not_ok(())?;
    not_ok(false)?;
    Ok(())
}

async fn throws_throw() -> TestResult {
    throws(|| raise("fail this test"))?;
    Ok(())
}

async fn throws_no_throw() -> TestResult {
    let hit = throws(|| Ok::<_, PlainError>(())).is_err();
    ok(hit)?;
    Ok(())
}

async fn throws_panic() -> TestResult {
    throws(|| -> Result<(), PlainError> { panic!("fail this test") })?;
    Ok(())
}

async fn throws_matcher_true() -> TestResult {
    throws_matching(|| raise("fail this test"), message_is("fail this test"))?;
    Ok(())
}

async fn throws_matcher_false() -> TestResult {
    let hit = throws_matching(|| raise("fail this test"), message_is("wut?")).is_err();
    ok(hit)?;
    Ok(())
}

async fn throws_type_matcher() -> TestResult {
    throws_matching(
        || Err::<(), _>(CustomError("fail this test".to_string())),
        Matcher::of_type::<CustomError>(),
    )?;
    Ok(())
}

async fn throws_pattern_matcher() -> TestResult {
    throws_matching(|| raise("fail this test"), Matcher::pattern("^fail this test$")?)?;
    Ok(())
}

async fn throws_literal_matcher() -> TestResult {
    throws_matching(|| raise("fail this test"), "fail this test")?;
    Ok(())
}

async fn rejects_reject() -> TestResult {
    rejects(async { raise("friendzoned") }).await?;
    Ok(())
}

async fn rejects_fail() -> TestResult {
    let hit = rejects(async { Ok::<_, PlainError>(()) }).await.is_err();
    ok(hit)?;
    Ok(())
}

async fn rejects_matcher_true() -> TestResult {
    rejects_matching(async { raise("friendzoned") }, message_is("friendzoned")).await?;
    Ok(())
}

async fn rejects_matcher_false() -> TestResult {
    let hit = rejects_matching(async { raise("friendzoned") }, message_is("seenzoned"))
        .await
        .is_err();
    ok(hit)?;
    Ok(())
}

async fn rejects_type_matcher() -> TestResult {
    rejects_matching(
        async { Err::<(), _>(CustomError("friendzoned".to_string())) },
        Matcher::of_type::<CustomError>(),
    )
    .await?;
    Ok(())
}

async fn rejects_pattern_matcher() -> TestResult {
    rejects_matching(async { raise("friendzoned") }, Matcher::pattern("^friendzoned$")?).await?;
    Ok(())
}

async fn rejects_literal_matcher() -> TestResult {
    rejects_matching(async { raise("friendzoned") }, "friendzoned").await?;
    Ok(())
}

/// The `test/harness` module.
pub fn suite() -> Suite {
    let mut builder = SuiteBuilder::new();
    builder
        .module("test/harness")
        .test("equal", equal_values)
        .test("notEqual", not_equal_values)
        .test("deep equal", deep_equal_values)
        .test("deep equal, serialized", deep_equal_serialized)
        .test("notDeepEqual", not_deep_equal_values)
        .test("ok, notOk", truthiness)
        .test("throws, throw", throws_throw)
        .test("throws, no throw", throws_no_throw)
        .test("throws, panic", throws_panic)
        .test("throws, matcher true", throws_matcher_true)
        .test("throws, matcher false", throws_matcher_false)
        .test("throws, type matcher", throws_type_matcher)
        .test("throws, RegExp matcher", throws_pattern_matcher)
        .test("throws, string matcher", throws_literal_matcher)
        .test("rejects", rejects_reject)
        .test("rejects fail", rejects_fail)
        .test("rejects, matcher true", rejects_matcher_true)
        .test("rejects, matcher false", rejects_matcher_false)
        .test("rejects, type matcher", rejects_type_matcher)
        .test("rejects, RegExp matcher", rejects_pattern_matcher)
        .test("rejects, string matcher", rejects_literal_matcher);
    builder.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::runner::{RunConfig, run_suite};

    #[tokio::test]
    async fn self_test_suite_passes() {
        let suite = suite();
        assert_eq!(suite.len(), 21);

        let report = run_suite(suite, &RunConfig::default()).await.unwrap();
        assert_eq!(report.lines.len(), 23);
        assert_eq!(report.lines[2], "ok 1 test/harness - equal");
        assert_eq!(report.lines[22], "ok 21 test/harness - rejects, string matcher");
        assert!(report.lines.iter().all(|line| !line.starts_with("not ok")));
    }
}
