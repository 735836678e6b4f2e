//! Assertion library.
//!
//! Every assertion returns an [`AssertResult`]: `Ok(())` when the constraint holds, otherwise an
//! [`AssertionFailure`] carrying the compared values, a message and the caller's source location. Assertions never
//! panic, so test bodies propagate failures with `?`.
//!
//! ```rust
//! use taptest::assert::{deep_equal, equal, AssertResultExt};
//! use taptest::Value;
//!
//! equal(1 + 1, 2).unwrap();
//! deep_equal(Value::array([1, 2]), Value::array([1, 2])).unwrap();
//! let err = equal("a", "b").with_message("letters").unwrap_err();
//! assert_eq!(err.message, "letters");
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe, Location};

use taptest_core::{Value, is_deep_equal, is_equal};
use thiserror::Error;

use crate::matcher::{Matcher, RaisedError};

/// Any thread-safe error, as raised by an operation under `throws`/`rejects`.
pub type BoxError = Box<RaisedError>;

/// Result of a single assertion.
pub type AssertResult = Result<(), AssertionFailure>;

/// A violated assertion.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    pub actual: Value,
    pub expected: Value,
    pub message: String,
    /// Where the assertion was called.
    pub location: &'static Location<'static>,
}

/// A panic caught while running an operation, carried as an error.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Panicked {
    pub message: String,
}

impl Panicked {
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "Box<dyn Any>".to_string(),
            },
        };
        Self { message }
    }
}

/// Replace the default message of a failing assertion.
pub trait AssertResultExt {
    fn with_message(self, message: impl Into<String>) -> Self;
}

impl AssertResultExt for AssertResult {
    fn with_message(self, message: impl Into<String>) -> Self {
        self.map_err(|mut failure| {
            failure.message = message.into();
            failure
        })
    }
}

fn failure_at(
    location: &'static Location<'static>,
    actual: impl Into<Value>,
    expected: impl Into<Value>,
    message: impl Into<String>,
) -> AssertionFailure {
    AssertionFailure {
        actual: actual.into(),
        expected: expected.into(),
        message: message.into(),
        location,
    }
}

/// Fail unless `pass` is true.
#[track_caller]
pub fn assert_true(
    pass: bool,
    actual: impl Into<Value>,
    expected: impl Into<Value>,
    message: impl Into<String>,
) -> AssertResult {
    if pass {
        Ok(())
    } else {
        Err(failure_at(Location::caller(), actual, expected, message))
    }
}

/// Fail unconditionally.
#[track_caller]
pub fn fail(message: impl Into<String>) -> AssertResult {
    assert_true(false, Value::Undefined, Value::Undefined, message)
}

#[track_caller]
pub fn ok(value: impl Into<Value>) -> AssertResult {
    let value = value.into();
    assert_true(value.is_truthy(), value, true, "Value must be truthy.")
}

#[track_caller]
pub fn not_ok(value: impl Into<Value>) -> AssertResult {
    let value = value.into();
    assert_true(!value.is_truthy(), value, false, "Value must be falsy.")
}

/// Same reference or same primitive; `NaN` equals `NaN`, `+0` differs from `-0`.
#[track_caller]
pub fn equal(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
    let (actual, expected) = (actual.into(), expected.into());
    assert_true(is_equal(&actual, &expected), actual, expected, "Value must be equal")
}

#[track_caller]
pub fn not_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
    let (actual, expected) = (actual.into(), expected.into());
    assert_true(!is_equal(&actual, &expected), actual, expected, "Value must not be equal")
}

/// Structural equality: same prototype, same sorted key set, deep-equal values.
#[track_caller]
pub fn deep_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
    let (actual, expected) = (actual.into(), expected.into());
    assert_true(is_deep_equal(&actual, &expected), actual, expected, "Value must be deep equal")
}

#[track_caller]
pub fn not_deep_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
    let (actual, expected) = (actual.into(), expected.into());
    assert_true(
        !is_deep_equal(&actual, &expected),
        actual,
        expected,
        "Value must not be deep equal",
    )
}

const THROWS_MESSAGE: &str = "Operation must throw an error";
const REJECTS_MESSAGE: &str = "Promise must reject";

/// Pass iff `operation` raises, by returning `Err` or by panicking.
#[track_caller]
pub fn throws<T, E, F>(operation: F) -> AssertResult
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    throws_matching(operation, Matcher::Any)
}

/// Pass iff `operation` raises an error accepted by `matcher`.
#[track_caller]
pub fn throws_matching<T, E, F>(operation: F, matcher: impl Into<Matcher>) -> AssertResult
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    let location = Location::caller();
    let matcher = matcher.into();
    let raised: Option<BoxError> = match panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(Ok(_)) => None,
        Ok(Err(err)) => Some(err.into()),
        Err(payload) => Some(Box::new(Panicked::from_payload(payload))),
    };
    check_raised(raised.as_deref(), &matcher, THROWS_MESSAGE, location)
}

/// Pass iff `awaitable` resolves to `Err`.
#[track_caller]
pub fn rejects<T, E, Fut>(awaitable: Fut) -> impl Future<Output = AssertResult>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    rejects_matching(awaitable, Matcher::Any)
}

/// Pass iff `awaitable` resolves to an `Err` accepted by `matcher`.
#[track_caller]
pub fn rejects_matching<T, E, Fut>(awaitable: Fut, matcher: impl Into<Matcher>) -> impl Future<Output = AssertResult>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let location = Location::caller();
    let matcher = matcher.into();
    async move {
        let raised: Option<BoxError> = awaitable.await.err().map(Into::into);
        check_raised(raised.as_deref(), &matcher, REJECTS_MESSAGE, location)
    }
}

fn check_raised(
    raised: Option<&RaisedError>,
    matcher: &Matcher,
    message: &str,
    location: &'static Location<'static>,
) -> AssertResult {
    match raised {
        None => Err(failure_at(location, "No error thrown", "Error thrown", message)),
        Some(error) if matcher.matches(error) => Ok(()),
        Some(error) => Err(failure_at(location, error.to_string(), matcher.describe(), message)),
    }
}
